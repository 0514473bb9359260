//! End-to-end tests of the read cycle against a simulated switch shell.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use switchscrape::channel::{PtyChannel, PtyConfig};
use switchscrape::error::SessionError;
use switchscrape::parser::{parse_cpu_utilization, parse_poe_table};
use switchscrape::session::DISABLE_PAGING_COMMANDS;
use switchscrape::{Error, MockSession, PromptPattern, Session, SessionState};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::Instant;

const POE_COMMAND: &str = "show power inline information interface";

const POE_TABLE: &str = "\
Interface  Power(W)  Current(mA)  Voltage(V)  PD-Class  Power-Status\r\n\
---------  --------  -----------  ----------  --------  ------------\r\n\
Tw1/0/1    4.2       84           52.0        Class1    ON\r\n\
Tw1/0/2    0.0       0            0.0         N/A       OFF";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Line-oriented stand-in for the switch CLI.
///
/// Echoes each command, asks for a password after `enable`, tracks the
/// prompt across `config`/`exit`, and stays silent on `reload`.
async fn fake_switch(mut io: DuplexStream, enable_secret: &'static str) {
    if io
        .write_all(b"\x1b[0mUser Access Verification\r\n\r\nSG2210XMP-M2>")
        .await
        .is_err()
    {
        return;
    }

    let mut prompt = "SG2210XMP-M2>";
    let mut awaiting_password = false;
    let mut pending = Vec::new();
    let mut buf = [0u8; 256];

    loop {
        let n = match io.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.windows(2).position(|w| w == b"\r\n") {
            let raw: Vec<u8> = pending.drain(..pos + 2).collect();
            let line = String::from_utf8_lossy(&raw[..pos]).into_owned();

            let reply = if awaiting_password {
                awaiting_password = false;
                if line == enable_secret {
                    prompt = "SG2210XMP-M2#";
                }
                format!("\r\n{}", prompt)
            } else {
                match line.as_str() {
                    "enable" => {
                        awaiting_password = true;
                        "enable\r\nPassword:".to_string()
                    }
                    "config" => {
                        prompt = "SG2210XMP-M2(config)#";
                        format!("config\r\n{}", prompt)
                    }
                    "exit" => {
                        prompt = "SG2210XMP-M2#";
                        format!("exit\r\n{}", prompt)
                    }
                    "reload" => continue,
                    POE_COMMAND => format!("{}\r\n{}\r\n\r\n{}", line, POE_TABLE, prompt),
                    _ => format!("{}\r\n\x1b[1m{}\x1b[0m", line, prompt),
                }
            };

            if io.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

fn connect_channel(secret: &'static str) -> PtyChannel<DuplexStream> {
    let (client, server) = tokio::io::duplex(4096);
    tokio::spawn(fake_switch(server, secret));

    PtyChannel::new(
        client,
        Arc::new(PromptPattern::tplink()),
        PtyConfig::default(),
    )
    .with_secondary_credential(SecretString::from(secret.to_string()))
}

#[tokio::test]
async fn test_disable_paging_then_read_poe_table() {
    init_logging();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut channel = connect_channel("s3cret");

    let banner = channel.open(deadline).await.unwrap();
    assert_eq!(banner, "User Access Verification");

    for command in DISABLE_PAGING_COMMANDS {
        channel.run(command, deadline).await.unwrap();
    }

    let response = channel.run(POE_COMMAND, deadline).await.unwrap();
    assert_eq!(response.prompt, "SG2210XMP-M2#");
    assert!(response.is_privileged());
    assert!(!response.result.contains('\r'));

    let ports = parse_poe_table(&response.result).unwrap();
    assert_eq!(ports.len(), 2);
    assert_eq!(ports["Tw1/0/1"].power_watts, 4.2);
    assert_eq!(ports["Tw1/0/1"].current_ma, 84);
    assert_eq!(ports["Tw1/0/2"].status, "OFF");

    channel.shutdown().await;
    assert_eq!(channel.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_enable_prompt_is_answered_transparently() {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut channel = connect_channel("s3cret");
    channel.open(deadline).await.unwrap();

    let response = channel.run("enable", deadline).await.unwrap();
    assert_eq!(response.result, "");
    assert_eq!(response.prompt, "SG2210XMP-M2#");
}

#[tokio::test]
async fn test_ansi_wrapped_prompt_is_stripped() {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut channel = connect_channel("s3cret");
    channel.open(deadline).await.unwrap();

    let response = channel.run("show system-info", deadline).await.unwrap();
    assert_eq!(response.result, "show system-info");
    assert_eq!(response.prompt, "SG2210XMP-M2>");
}

#[tokio::test(start_paused = true)]
async fn test_silent_device_times_out_and_session_is_unusable() {
    let mut channel = connect_channel("s3cret");
    channel
        .open(Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();

    let err = channel
        .run("reload", Instant::now() + Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(channel.state(), SessionState::Busy);

    let err = channel
        .run("show system-info", Instant::now() + Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::Unusable { .. })));
}

/// Host-side code written against the capability, not a concrete session.
async fn cpu_load<S: Session>(session: &mut S, deadline: Instant) -> switchscrape::Result<u32> {
    let response = session.run("show cpu-utilization", deadline).await?;
    Ok(parse_cpu_utilization(&response.result)?.five_seconds)
}

#[tokio::test]
async fn test_host_code_against_mock_session() {
    let deadline = Instant::now() + Duration::from_secs(1);
    let mut session = MockSession::new().respond(
        "show cpu-utilization",
        "Five seconds  One minute  Five minutes\r\n| 7%  | 5%  | 3%\r\n",
    );

    session.connect(deadline).await.unwrap();
    assert_eq!(cpu_load(&mut session, deadline).await.unwrap(), 7);
    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_command_sequence_aborts_at_first_failure() {
    let deadline = Instant::now() + Duration::from_secs(1);
    let mut session = MockSession::new().hang_on("no clipaging");
    session.connect(deadline).await.unwrap();

    let err = session
        .run_commands(&["enable", "no clipaging", "exit"], deadline)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    match err {
        Error::Session(SessionError::CommandFailed { command, .. }) => {
            assert_eq!(command, "no clipaging")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.history(), ["enable", "no clipaging"]);
}
