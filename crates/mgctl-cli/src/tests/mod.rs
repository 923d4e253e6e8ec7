//! End-to-end sessions of the client runtime against a scripted peer.

mod support;

use std::process::ExitCode;

use anyhow::{Context, Result};
use mgctl_protocol::{Argument, MAX_FRAME_LEN, RequestId, address};
use rstest::rstest;

use crate::errors::exit_status;
use support::{FakePeer, complete_all, run_client, subscriptions, summarise};

#[test]
fn exec_commands_are_sent_after_subscriptions() -> Result<()> {
    let peer = FakePeer::spawn(|connection| {
        connection.serve(|request, id| {
            if request.matches(address::EVAL) {
                vec![(address::TEXT, vec![Argument::Int(id.get()), "slots listed".into()])]
            } else {
                Vec::new()
            }
        })
    })?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "-e", "print slots"], "")?;
    let requests = peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let mut expected = subscriptions();
    expected.push((address::EVAL.to_owned(), vec!["print slots".into()]));
    assert_eq!(summarise(&requests), expected);

    assert!(
        outcome
            .stdout
            .starts_with(&format!("connecting to {socket}  ... \n"))
    );
    assert!(outcome.stdout.contains("Running: print slots\n"));
    assert!(outcome.stdout.contains("slots listed\n"));
    assert_eq!(outcome.stdout.matches("/done: \n").count(), 3);
    assert!(outcome.stderr.is_empty());
    Ok(())
}

#[test]
fn interactive_input_stops_at_quit() -> Result<()> {
    let peer = FakePeer::spawn(complete_all)?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "-i"], "eval x=1\n\n  quit\neval x=2\n")?;
    let requests = peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let mut expected = subscriptions();
    expected.push((address::EVAL.to_owned(), vec!["eval x=1".into()]));
    assert_eq!(summarise(&requests), expected);
    Ok(())
}

#[test]
fn peer_errors_are_written_to_stderr() -> Result<()> {
    let peer = FakePeer::spawn(|connection| {
        connection.serve(|request, id| {
            if request.matches(address::EVAL) {
                vec![(
                    address::ERROR,
                    vec![
                        Argument::Int(id.get()),
                        "unknown device".into(),
                        "profile.cfg".into(),
                        Argument::Int(3),
                    ],
                )]
            } else {
                Vec::new()
            }
        })
    })?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "-e", "move pad9 slot1"], "")?;
    peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert_eq!(outcome.stderr, "unknown device(profile.cfg:3)\n");
    Ok(())
}

#[test]
fn commands_with_nul_bytes_are_reported_and_skipped() -> Result<()> {
    let peer = FakePeer::spawn(complete_all)?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "-i"], "bad\0line\nprint slots\n")?;
    let requests = peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stderr.contains("contains a NUL byte"));
    let summary = summarise(&requests);
    assert_eq!(summary.len(), 3);
    assert_eq!(
        requests.last().map(|message| message.arguments().to_vec()),
        Some(vec![Argument::Int(4), "print slots".into()])
    );
    Ok(())
}

#[test]
fn peer_closing_early_reports_outstanding_requests() -> Result<()> {
    let peer = FakePeer::spawn(|connection| {
        connection.next_request()?;
        connection.next_request()?;
        Ok(())
    })?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket], "")?;
    peer.join()?;

    assert_eq!(outcome.exit, ExitCode::from(exit_status::OUTSTANDING));
    assert!(
        outcome
            .stderr
            .contains("connection closed by peer; 2 request(s) never completed: 1, 2"),
        "stderr: {}",
        outcome.stderr
    );
    Ok(())
}

#[test]
#[expect(clippy::little_endian_bytes, reason = "peer writes native u32 length")]
fn oversized_frame_stops_the_receive_loop() -> Result<()> {
    let peer = FakePeer::spawn(|connection| {
        connection.next_request()?;
        connection.next_request()?;
        let declared = u32::try_from(MAX_FRAME_LEN).context("bound fits in u32")?;
        connection.send_raw(&declared.to_le_bytes())?;
        connection.drain()
    })?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket], "")?;
    peer.join()?;

    assert_eq!(outcome.exit, ExitCode::from(exit_status::OUTSTANDING));
    assert!(outcome.stderr.contains("exceeds the maximum"), "stderr: {}", outcome.stderr);
    Ok(())
}

#[test]
fn wait_timeout_bounds_the_shutdown() -> Result<()> {
    let peer = FakePeer::spawn(|connection| connection.drain())?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "--wait-timeout", "1"], "")?;
    let requests = peer.join()?;

    assert_eq!(outcome.exit, ExitCode::from(exit_status::TIMED_OUT));
    assert!(outcome.stderr.contains("2 request(s)"));
    assert_eq!(requests.len(), 2);
    Ok(())
}

#[test]
fn stray_completion_does_not_disturb_the_session() -> Result<()> {
    let peer = FakePeer::spawn(|connection| {
        let mut ids = Vec::new();
        while ids.len() < 2 {
            let request = connection
                .next_request()?
                .context("client closed before subscribing")?;
            let (id, _) = request.correlate().context("request without id")?;
            ids.push(id);
        }
        connection.done(RequestId::new(999))?;
        for id in ids {
            connection.done(id)?;
        }
        connection.drain()
    })?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket], "")?;
    peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout.matches("/done: \n").count(), 3);
    assert!(outcome.stderr.is_empty());
    Ok(())
}

#[test]
fn unrepresentable_wait_timeout_still_drains() -> Result<()> {
    let peer = FakePeer::spawn(complete_all)?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "--wait-timeout", &u64::MAX.to_string()], "")?;
    peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    Ok(())
}

#[test]
fn json_output_emits_one_object_per_message() -> Result<()> {
    let peer = FakePeer::spawn(|connection| {
        connection.serve(|request, id| {
            if request.matches(address::EVAL) {
                vec![(address::TEXT, vec![Argument::Int(id.get()), "ok".into()])]
            } else {
                Vec::new()
            }
        })
    })?;
    let socket = peer.socket_path()?;

    let outcome = run_client(&["-S", &socket, "--output", "json", "-e", "x"], "")?;
    peer.join()?;

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let records = outcome
        .stdout
        .lines()
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<Result<Vec<_>, _>>()
        .context("every stdout line is JSON")?;
    assert_eq!(records.len(), 4);
    assert!(records.contains(&serde_json::json!({
        "id": 3,
        "address": "/text",
        "arguments": ["ok"]
    })));
    Ok(())
}

#[test]
fn connect_failure_has_its_own_exit_code() -> Result<()> {
    let dir = tempfile::tempdir().context("temp dir")?;
    let path = dir.path().join("absent.sock");
    let socket = path.to_str().context("utf8 path")?;

    let outcome = run_client(&["-S", socket], "")?;

    assert_eq!(outcome.exit, ExitCode::from(exit_status::CONNECT));
    assert!(outcome.stderr.contains("failed to connect"));
    Ok(())
}

#[rstest]
#[case::long("--version")]
#[case::short("-v")]
fn version_is_printed(#[case] flag: &str) -> Result<()> {
    let outcome = run_client(&[flag], "")?;
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert_eq!(
        outcome.stdout,
        format!("moltengamepadctl version {}\n", env!("CARGO_PKG_VERSION"))
    );
    Ok(())
}

#[test]
fn help_goes_to_stdout() -> Result<()> {
    let outcome = run_client(&["--help"], "")?;
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("--socket-path"));
    assert!(outcome.stdout.contains("--exec"));
    Ok(())
}

#[test]
fn unknown_flag_is_a_usage_error() -> Result<()> {
    let outcome = run_client(&["--bogus"], "")?;
    assert_eq!(outcome.exit, ExitCode::from(exit_status::USAGE));
    assert!(outcome.stderr.contains("--bogus"));
    Ok(())
}
