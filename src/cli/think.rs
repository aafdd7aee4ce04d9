//! `organon think` - one request against a simulated node

use anyhow::{bail, Context, Result};
use organon_core::{Modality, Payload, Request};
use serde_json::Value;

use crate::server::{build_session_for_cli, load_config};

/// Arguments for a single request
#[derive(Debug)]
pub struct ThinkArgs {
    pub node: String,
    pub model: String,
    pub modality: Modality,
    pub structured: bool,
    pub load: Option<f64>,
    pub ceiling: Option<f64>,
    pub payload: String,
}

/// Run one request, print the JSON result and shut the session down.
pub async fn run(args: ThinkArgs) -> Result<()> {
    let mut config = load_config().context("Failed to load configuration")?;
    if let Some(load) = args.load {
        config.sim.load = load;
    }
    if let Some(ceiling) = args.ceiling {
        config.orchestrator.load_ceiling = ceiling;
    }

    let request = Request::new(parse_payload(&args.payload, args.structured)?, args.modality);
    let session = build_session_for_cli(&config, &args.node, &args.model).await?;

    let result = session.think(request).await;
    session.shutdown().await?;

    let result = result?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn parse_payload(raw: &str, structured: bool) -> Result<Payload> {
    if !structured {
        return Ok(Payload::Text(raw.to_string()));
    }
    match serde_json::from_str::<Value>(raw).context("Structured payload is not valid JSON")? {
        Value::Object(map) => Ok(Payload::Structured(map)),
        _ => bail!("Structured payload must be a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        assert_eq!(
            parse_payload("hello", false).unwrap(),
            Payload::Text("hello".to_string())
        );
        assert!(matches!(
            parse_payload(r#"{"content": "hi"}"#, true).unwrap(),
            Payload::Structured(_)
        ));
        assert!(parse_payload("[1, 2]", true).is_err());
        assert!(parse_payload("not json", true).is_err());
    }
}
