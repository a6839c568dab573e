use clap::Parser;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Gateway URL
    #[arg(short, long, default_value = "http://127.0.0.1:4000/")]
    pub url: String,

    /// Method to call, e.g. getblockchaininfo
    #[arg(short, long)]
    pub method: String,

    /// Params as a JSON array (or object), e.g. '["<blockhash>", 1]'
    #[arg(short, long, default_value = "[]")]
    pub params: String,

    /// Request id
    #[arg(long, default_value_t = 1)]
    pub id: u64,
}

/// Build the JSON-RPC request body for `args`.
pub fn build_request(args: &CallArgs) -> anyhow::Result<Value> {
    let params: Value = serde_json::from_str(&args.params)?;
    Ok(json!({
        "method": args.method,
        "params": params,
        "id": args.id,
    }))
}

/// Send one request to a running gateway and print the response.
pub async fn run_call(args: CallArgs) -> anyhow::Result<()> {
    let req = build_request(&args)?;

    let response = reqwest::Client::new()
        .post(&args.url)
        .json(&req)
        .send()
        .await?
        .error_for_status()?;

    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}
