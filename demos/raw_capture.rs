use std::io::Write;

use sinkroll::{Configurator, SinkConfig, SinkKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configurator = Configurator::new();
    configurator.setup(
        SinkConfig::new()
            .with_prefix("demo")
            .with_root_dir("logs")
            .with_sinks([SinkKind::ConsoleRaw, SinkKind::FileRaw]),
    )?;

    let mut stdout = configurator.stdout();
    writeln!(stdout, "this line reaches the console and logs/demo.stdout")?;

    let mut stderr = configurator.stderr();
    writeln!(stderr, "and this one the console and logs/demo.stderr")?;

    // Dropping console-raw keeps the file capture while prints fall back
    // to the real console once file-raw is torn down too.
    configurator.disable_named(&["console-raw"])?;
    writeln!(stdout, "captured to file only")?;

    Ok(())
}
