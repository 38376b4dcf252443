//! `ctgen dev-server` command

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::cli::DevServerArgs;
use ctgen::ops::dev_server::{compose_dev_server_factory, EmitDevServer, FileConfigDiscovery};

/// Parse `--options`, an empty object when absent.
pub fn parse_options(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("`--options` is not valid JSON")?;
    if !value.is_object() {
        bail!(
            "`--options` must be a JSON object\n\
             \n\
             Example: --options '{{\"port\": 8080}}'"
        );
    }
    Ok(value)
}

pub fn execute(args: DevServerArgs) -> Result<()> {
    let options = parse_options(args.options.as_deref())?;
    let factory = compose_dev_server_factory(args.ts_config.as_deref(), args.compiler, None);

    let written = factory.start(
        &FileConfigDiscovery::new(&args.base_config),
        &EmitDevServer::new(&args.output),
        options,
    )?;

    eprintln!(
        "     Written dev server configuration ({}) to {}",
        factory.compiler(),
        written.display()
    );
    Ok(())
}
