use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

use kennel_analytics::{
    save_transformed, setup_database, AnalysisConfig, DataExtractor, DataTransformer,
    EnvironmentalAnalyzer, OperationsAnalyzer, WellnessAnalyzer,
};
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut data_dir = "data".to_string();
    let mut db_path: Option<PathBuf> = None;
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--db" {
            db_path = args.get(i + 1).map(PathBuf::from);
            i += 2;
        } else {
            data_dir = args[i].clone();
            i += 1;
        }
    }

    println!("🐾 Kennel Analytics - ETL + Analysis Pipeline");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Extract
    println!("\n📂 Extracting from {data_dir}/ ...");
    let extractor = DataExtractor::new(&data_dir);
    let raw = extractor.extract_all()?;
    println!(
        "✓ {} activities, {} environment readings, {} staff shifts",
        raw.activities.len(),
        raw.environment.len(),
        raw.staff.len()
    );

    // 2. Transform
    println!("\n🔧 Transforming...");
    let transformer = DataTransformer::new();
    let data = transformer.transform_all(&raw);
    println!(
        "✓ {} activities, {} readings, {} shifts retained; {} daily summary rows",
        data.activities.len(),
        data.environment.len(),
        data.staff.len(),
        data.daily_summary.len()
    );

    // 3. Persist (optional)
    if let Some(path) = db_path {
        println!("\n💾 Saving to {} ...", path.display());
        let conn = Connection::open(&path)?;
        setup_database(&conn)?;
        save_transformed(&conn, &data)?;
        println!("✓ Database updated");
    }

    // 4. Analyze
    let config = Arc::new(AnalysisConfig::default());
    let reference = Local::now().naive_local();

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🐕 PET WELLNESS");
    let wellness = WellnessAnalyzer::new(&data.activities, Arc::clone(&config));
    match wellness.wellness_summary(reference) {
        Ok(summary) => {
            println!("  Pets analyzed:          {}", summary.total_pets);
            println!("  Activity wellness rate: {:.1}%", summary.activity_wellness_rate);
            println!("  Feeding wellness rate:  {:.1}%", summary.feeding_wellness_rate);
            for pet in &summary.pets_needing_attention {
                println!(
                    "  ⚠ {} ({}): {:.1} min/day [{}]",
                    pet.pet_name,
                    pet.pet_id,
                    pet.avg_daily_minutes,
                    pet.activity_status.as_str()
                );
            }
        }
        Err(e) => println!("  (skipped: {e})"),
    }

    println!("\n🌡️  ENVIRONMENTAL COMFORT");
    let environmental = EnvironmentalAnalyzer::new(&data.environment, Arc::clone(&config));
    match environmental.environmental_summary(Some(&data.activities), reference) {
        Ok(summary) => {
            let overall = &summary.conditions.overall;
            println!("  Comfort score:   {:.1}/100", summary.overall_comfort_score);
            println!(
                "  Temperature:     {:.1}°F (range {:.1}-{:.1})",
                overall.temperature.mean, overall.temperature.min, overall.temperature.max
            );
            println!("  Humidity:        {:.1}%", overall.humidity.mean);
            println!("  Noise:           {:.1} dB", overall.noise.mean);
            if let Some(noise) = &summary.noise_monitoring {
                println!(
                    "  Noise alerts:    {} total, {} critical ({:.2}/day)",
                    noise.total_alerts, noise.critical_alerts, noise.alerts_per_day
                );
            }
            if let Some(corr) = &summary.temperature_activity_insights {
                println!(
                    "  Temp/activity:   r={:.3} ({}), best range: {}",
                    corr.temperature_activity_correlation,
                    corr.correlation_strength.as_str(),
                    corr.optimal_temperature_range.as_str()
                );
            }
        }
        Err(e) => println!("  (skipped: {e})"),
    }

    println!("\n📋 OPERATIONS");
    let operations = OperationsAnalyzer::new(&data.staff, &data.activities, Arc::clone(&config));
    let summary = operations.operations_summary(reference);
    println!("  Operations score: {:.1}/100", summary.operations_score);
    if let Some(grooming) = &summary.grooming_operations {
        println!(
            "  Grooming:         {:.1}% compliance, {} pets overdue",
            grooming.schedule_compliance,
            grooming.pets_overdue_grooming.len()
        );
    }
    if let Some(staff) = &summary.staff_performance {
        println!(
            "  Staff:            {} analyzed, {:.2} avg tasks/hour",
            staff.total_staff_analyzed, staff.avg_tasks_per_hour_kennel
        );
    }
    if let Some(alerts) = &summary.alert_management {
        println!(
            "  Alerts:           {} health, {} feeding delays",
            alerts.total_health_alerts, alerts.total_feeding_delays
        );
    }
    println!("\n  Recommendations:");
    for recommendation in &summary.key_recommendations {
        println!("   • {recommendation}");
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Pipeline complete");

    Ok(())
}
