mod batch_driver;
mod config;
mod config_persistence;
mod entity_resolver;
mod http_transport;
mod image_fetcher;
mod image_pipeline;
mod image_store;
mod media_file_discovery;
mod normalizer;
mod protocol;
mod request_pacer;

use std::path::Path;
use std::time::Duration;

use batch_driver::BatchDriver;
use http_transport::UreqTransport;
use log::info;
use normalizer::Normalizer;
use request_pacer::GovernorPacer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config =
        config_persistence::load_config_file(Path::new(config_persistence::CONFIG_FILE_NAME));
    log::set_max_level(config.logging.level.to_level_filter());

    let transport = UreqTransport::new(&config.http);
    let mut pacer = GovernorPacer::new(Duration::from_millis(config.http.request_interval_ms));
    BatchDriver::new(&config, &transport).run(&mut pacer);

    if config.processing.normalize_after_batch {
        Normalizer::from_config(&config).run();
    } else {
        info!("Normalization disabled; leaving raw images as-is");
    }

    Ok(())
}
