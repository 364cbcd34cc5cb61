//! Arbitrary authenticated operations.

use super::Context;
use crate::output;
use anyhow::{Context as _, Result};
use gql_transport::{FetchPolicy, Operation};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Arguments of `authctl query`.
pub struct QueryRequest {
    pub name: String,
    pub document: Option<String>,
    pub file: Option<PathBuf>,
    pub vars: Vec<String>,
    pub mutation: bool,
    pub network_only: bool,
}

/// Parse `KEY=VALUE`. VALUE is JSON if it parses as JSON, a string otherwise.
fn parse_var(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("variable {:?} is not KEY=VALUE", raw))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("variable {:?} has an empty name", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn load_document(request: &QueryRequest) -> Result<String> {
    match (&request.document, &request.file) {
        (Some(document), _) => Ok(document.clone()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        (None, None) => anyhow::bail!("pass the operation with --document or --file"),
    }
}

fn build_operation(request: &QueryRequest) -> Result<Operation> {
    let document = load_document(request)?;
    let variables = request
        .vars
        .iter()
        .map(|raw| parse_var(raw))
        .collect::<Result<Map<String, Value>>>()?;

    let operation = if request.mutation {
        Operation::mutation(&request.name, document)
    } else if request.network_only {
        Operation::query(&request.name, document).with_fetch_policy(FetchPolicy::NetworkOnly)
    } else {
        Operation::query(&request.name, document)
    };

    Ok(operation.with_variables(variables))
}

/// Run the operation and print its data as JSON.
pub async fn query(ctx: &Context, request: QueryRequest) -> Result<()> {
    let operation = build_operation(&request)?;
    let data = ctx
        .client
        .pipeline()
        .execute(operation)
        .await
        .with_context(|| format!("{} failed", request.name))?;

    output::print_json(&data);
    Ok(())
}
