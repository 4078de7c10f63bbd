pub mod analysis;
pub mod commands;
pub mod models;
pub mod workflow;

/// Installs the `env_logger` backend. Filter defaults to `info` and follows
/// `RUST_LOG` when set. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::{
        dashboard::{
            generate_demo_data, get_bottlenecks, get_capacity_forecasts, get_flow_metrics, get_kpis,
            import_work_items, list_work_items, open_workspace,
        },
        db::{get_metric_snapshots, take_snapshot},
        settings::{get_settings, save_settings},
        workflow::{
            add_opportunity_comment, advance_opportunity_stage, assign_opportunity, create_opportunity,
            get_stage_bottlenecks, list_opportunities, SharedRepository,
        },
    };
    use std::sync::{Arc, Mutex};

    init_logging();
    log::info!("Starting NUVIO {}", env!("CARGO_PKG_VERSION"));

    let repository: SharedRepository = Arc::new(Mutex::new(workflow::OpportunityRepository::new()));

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(repository)
        .invoke_handler(tauri::generate_handler![
            open_workspace,
            get_settings,
            save_settings,
            generate_demo_data,
            import_work_items,
            list_work_items,
            get_flow_metrics,
            get_bottlenecks,
            get_kpis,
            get_capacity_forecasts,
            take_snapshot,
            get_metric_snapshots,
            create_opportunity,
            advance_opportunity_stage,
            assign_opportunity,
            add_opportunity_comment,
            list_opportunities,
            get_stage_bottlenecks,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
