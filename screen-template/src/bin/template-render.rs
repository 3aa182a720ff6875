use screen_template::{Context, Engine, EngineConfig, TemplateError};
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: template-render <config.yaml> <templateId> [context.json]");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  template-render screens.yaml /index");
        eprintln!("  template-render screens.yaml /profile user.json");
        process::exit(1);
    }

    let context_path = args.get(3).map(String::as_str);
    match render(&args[1], &args[2], context_path) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("✗ {} could not be rendered:", args[2]);
            print_error(&e);
            process::exit(1);
        }
    }
}

fn render(
    config_path: &str,
    template_id: &str,
    context_path: Option<&str>,
) -> Result<String, TemplateError> {
    let config = EngineConfig::from_file(config_path)?;
    let engine = Engine::from_config(&config);

    let context = match context_path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Context::from(serde_json::from_str::<serde_json::Value>(&content)?)
        }
        None => Context::new(),
    };

    let tree = engine.render(template_id, &context)?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

fn print_error(error: &TemplateError) {
    match error {
        TemplateError::TemplateMarkup {
            template_id,
            message,
        } => {
            eprintln!("  Markup error in template '{}':", template_id);
            eprintln!("    {}", message);
        }
        TemplateError::UnresolvedTemplate { template_id } => {
            eprintln!("  Template '{}' not found and no default template configured", template_id);
        }
        TemplateError::Config(msg) => {
            eprintln!("  Configuration error:");
            eprintln!("    {}", msg);
        }
        TemplateError::Io(msg) => {
            eprintln!("  Failed to read file:");
            eprintln!("    {}", msg);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
