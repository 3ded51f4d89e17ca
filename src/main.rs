use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use midiacode::credentials::API_KEY_HEADER;
use midiacode::{load_config, ConnectorConfig, FieldValues, MidiacodeCredentials, MidiacodeNode};
use serde_json::Value;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "midiacode", version, about = "Midiacode API connector")]
struct Cli {
    /// TOML config file (defaults to $MIDIACODE_CONFIG when set)
    #[arg(long, env = "MIDIACODE_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node and credential description as JSON
    Describe,

    /// Print the request an operation would send, without sending it
    Build {
        resource: String,
        operation: String,
        /// Field value as key=value (`key=null` clears a field)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },

    /// Run an operation and print the JSON response
    Run {
        resource: String,
        operation: String,
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },

    /// Check the API key against its workspace
    Verify,
}

fn parse_params(params: &[String]) -> Result<FieldValues> {
    let mut values = FieldValues::new();
    for param in params {
        let (key, raw) = param
            .split_once('=')
            .ok_or_else(|| anyhow!("parameter '{}' must be key=value", param))?;
        let value = match raw {
            "null" => Value::Null,
            _ => Value::String(raw.to_string()),
        };
        values.insert(key.to_string(), value);
    }
    Ok(values)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "midiacode=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConnectorConfig::default(),
    };
    info!(
        base_url = %config.api.base_url,
        notification_base_url = %config.api.notification_base_url,
        "Configuration loaded"
    );

    match cli.cmd {
        Command::Describe => {
            let description = serde_json::to_string_pretty(&MidiacodeNode::describe())?;
            println!("{}", description);
        }
        Command::Build {
            resource,
            operation,
            params,
        } => {
            let values = parse_params(&params)?;
            let router = midiacode::Router::with_api(config.api.clone());
            let mut request = router.prepare(&resource, &operation, &values)?;
            if let Ok(credentials) = MidiacodeCredentials::from_env() {
                credentials.authenticate(&mut request);
            }
            let printable = request.redacted(&[API_KEY_HEADER]);
            println!("{} {}", printable.method.as_str(), printable.full_url());
            println!("{}", serde_json::to_string_pretty(&printable)?);
        }
        Command::Run {
            resource,
            operation,
            params,
        } => {
            let values = parse_params(&params)?;
            let credentials = MidiacodeCredentials::from_env()?;
            let node = MidiacodeNode::from_config(&config, credentials)?;
            let body = node
                .execute(&resource, &operation, &values)
                .await
                .with_context(|| format!("{} {} failed", resource, operation))?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Verify => {
            let credentials = MidiacodeCredentials::from_env()?;
            let node = MidiacodeNode::from_config(&config, credentials)?;
            node.test_credentials().await?;
            println!("Credentials are valid");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params() {
        let values = parse_params(&[
            "workspaceId=ws-1".to_string(),
            "pageSize=50".to_string(),
            "private=true".to_string(),
            "searchTerm=a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(values["workspaceId"], json!("ws-1"));
        assert_eq!(values["pageSize"], json!("50"));
        assert_eq!(values["private"], json!("true"));
        assert_eq!(values["searchTerm"], json!("a=b"));

        let values = parse_params(&["productVariant=null".to_string()]).unwrap();
        assert_eq!(values["productVariant"], Value::Null);
    }

    #[test]
    fn test_params_keep_string_text() {
        let values = parse_params(&[
            "contentId=c".to_string(),
            "workspaceIdBody=w".to_string(),
            "version=2.10".to_string(),
            "private=true".to_string(),
        ])
        .unwrap();
        let body = midiacode::Router::new()
            .prepare("content", "updateLink", &values)
            .unwrap()
            .body
            .unwrap();
        assert_eq!(body["version"], json!("2.10"));
        assert_eq!(body["private"], json!(true));

        let values = parse_params(&[
            "title=1e3".to_string(),
            "workspaceIdBody=w".to_string(),
            "priority=3".to_string(),
        ])
        .unwrap();
        let body = midiacode::Router::new()
            .prepare("content", "create", &values)
            .unwrap()
            .body
            .unwrap();
        assert_eq!(body["title"], json!("1e3"));
        assert_eq!(body["priority"], json!(3));
    }

    #[test]
    fn test_parse_params_requires_equals() {
        let err = parse_params(&["title".to_string()]).unwrap_err();
        assert!(err.to_string().contains("key=value"));
    }
}
