use sinkroll::{Configurator, SinkConfig, SinkKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configurator = Configurator::new();
    configurator.setup(
        SinkConfig::new()
            .with_prefix("demo")
            .with_root_dir("logs")
            .with_retention_days(5)
            .with_sinks([SinkKind::ConsoleLog, SinkKind::FileLog]),
    )?;
    configurator.init()?;

    tracing::info!("structured record, rendered to the console and logs/demo.log");
    tracing::warn!("completed hourly windows are archived under logs/YYYY-MM-DD/");

    Ok(())
}
