//! Print the PoE table of a switch as JSON.
//!
//! # Usage
//!
//! ```bash
//! TPLINK_ADDR=192.168.0.1 TPLINK_USER=admin TPLINK_PASS=secret \
//!     cargo run --example poe_report
//! ```
//!
//! `TPLINK_ADDR` may carry a port (`host:port`). Set `RUST_LOG=debug` to see
//! the session transcript.

use std::env;
use std::time::Duration;

use switchscrape::parser::parse_poe_table;
use switchscrape::{Session, SessionBuilder};
use tokio::time::Instant;

const POE_COMMAND: &str = "show power inline information interface";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (Ok(addr), Ok(user), Ok(pass)) = (
        env::var("TPLINK_ADDR"),
        env::var("TPLINK_USER"),
        env::var("TPLINK_PASS"),
    ) else {
        eprintln!("Please set TPLINK_ADDR, TPLINK_USER, and TPLINK_PASS environment variables");
        std::process::exit(1);
    };

    let (host, port) = match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse()?),
        None => (addr, 22),
    };

    let mut session = SessionBuilder::new(host)
        .port(port)
        .username(user)
        .password(pass)
        .disable_paging()
        .build()?;

    let deadline = Instant::now() + Duration::from_secs(15);
    let result = async {
        session.connect(deadline).await?;
        session.run(POE_COMMAND, deadline).await
    }
    .await;
    session.close().await;

    let ports = parse_poe_table(&result?.result)?;
    println!("{}", serde_json::to_string_pretty(&ports)?);

    Ok(())
}
