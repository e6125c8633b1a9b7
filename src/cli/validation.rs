use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.base_url.as_deref() {
        crate::controller::Endpoint::new(raw)
            .map_err(|e| format!("invalid --base-url '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, or html"
            ));
        }
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if args.reg.is_some() && args.interactive {
        return Err("use either --reg or --interactive, not both".to_string());
    }
    Ok(())
}
