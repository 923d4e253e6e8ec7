//! Test support for end-to-end sessions against a scripted peer.
//!
//! The fake peer listens on a Unix socket in a temporary directory, accepts
//! one client and runs a script against it, recording every request it reads.

use std::ffi::OsString;
use std::io::{Cursor, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::{Context, Result, anyhow};
use mgctl_protocol::{
    Argument, FrameReader, Message, RequestId, address, decode_packet, encode_message,
    write_frame,
};
use tempfile::TempDir;

/// The client side of the socket, as seen by the peer.
pub(super) struct PeerConnection {
    frames: FrameReader<UnixStream>,
    writer: UnixStream,
    received: Vec<Message>,
}

impl PeerConnection {
    fn new(stream: UnixStream) -> Result<Self> {
        let writer = stream.try_clone().context("clone peer stream")?;
        Ok(Self {
            frames: FrameReader::new(stream),
            writer,
            received: Vec::new(),
        })
    }

    /// Reads the next request, or `None` once the client has closed.
    pub(super) fn next_request(&mut self) -> Result<Option<Message>> {
        let Ok(frame) = self.frames.read_frame() else {
            return Ok(None);
        };
        let mut messages = decode_packet(&frame).context("decode client request")?;
        let message = messages
            .pop()
            .ok_or_else(|| anyhow!("client sent an empty packet"))?;
        self.received.push(message.clone());
        Ok(Some(message))
    }

    pub(super) fn reply(&mut self, address: &str, arguments: &[Argument]) -> Result<()> {
        let payload = encode_message(address, arguments).context("encode reply")?;
        write_frame(&mut self.writer, &payload).context("write reply")?;
        Ok(())
    }

    pub(super) fn done(&mut self, id: RequestId) -> Result<()> {
        self.reply(address::DONE, &[Argument::Int(id.get())])
    }

    pub(super) fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).context("write raw bytes")?;
        self.writer.flush().context("flush raw bytes")
    }

    /// Reads and records requests until the client closes.
    pub(super) fn drain(&mut self) -> Result<()> {
        while self.next_request()?.is_some() {}
        Ok(())
    }

    /// Completes every request, first sending whatever `respond` returns.
    pub(super) fn serve<F>(&mut self, mut respond: F) -> Result<()>
    where
        F: FnMut(&Message, RequestId) -> Vec<(&'static str, Vec<Argument>)>,
    {
        while let Some(request) = self.next_request()? {
            let (id, _) = request
                .correlate()
                .ok_or_else(|| anyhow!("request without id: {request:?}"))?;
            for (address, arguments) in respond(&request, id) {
                self.reply(address, &arguments)?;
            }
            self.done(id)?;
        }
        Ok(())
    }
}

/// A peer accepting one client on a temporary Unix socket.
pub(super) struct FakePeer {
    _dir: TempDir,
    path: PathBuf,
    handle: Option<thread::JoinHandle<Result<Vec<Message>>>>,
}

impl FakePeer {
    pub(super) fn spawn<F>(script: F) -> Result<Self>
    where
        F: FnOnce(&mut PeerConnection) -> Result<()> + Send + 'static,
    {
        let dir = tempfile::tempdir().context("create socket directory")?;
        let path = dir.path().join("mg.sock");
        let listener = UnixListener::bind(&path).context("bind fake peer")?;
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept client")?;
            let mut connection = PeerConnection::new(stream)?;
            script(&mut connection)?;
            Ok(connection.received)
        });
        Ok(Self {
            _dir: dir,
            path,
            handle: Some(handle),
        })
    }

    pub(super) fn socket_path(&self) -> Result<String> {
        self.path
            .to_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("socket path is not UTF-8"))
    }

    /// Waits for the script to finish and returns the recorded requests.
    pub(super) fn join(mut self) -> Result<Vec<Message>> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("fake peer already joined"))?;
        handle
            .join()
            .map_err(|_| anyhow!("fake peer thread panicked"))?
    }
}

/// Completes every request without further output.
pub(super) fn complete_all(connection: &mut PeerConnection) -> Result<()> {
    connection.serve(|_, _| Vec::new())
}

/// Output captured from one run of the client.
pub(super) struct RunOutcome {
    pub(super) exit: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

/// Runs the client with `args` after the program name.
pub(super) fn run_client(args: &[&str], input: &str) -> Result<RunOutcome> {
    let mut argv = vec![OsString::from("moltengamepadctl")];
    argv.extend(args.iter().map(OsString::from));
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = crate::run(argv, Cursor::new(input.to_owned()), &mut stdout, &mut stderr);
    Ok(RunOutcome {
        exit,
        stdout: String::from_utf8(stdout).context("stdout utf8")?,
        stderr: String::from_utf8(stderr).context("stderr utf8")?,
    })
}

/// Address and arguments (after the id) of each request.
pub(super) fn summarise(requests: &[Message]) -> Vec<(String, Vec<Argument>)> {
    requests
        .iter()
        .map(|message| {
            (
                message.address().to_owned(),
                message.arguments().iter().skip(1).cloned().collect(),
            )
        })
        .collect()
}

/// The two subscriptions every session opens with.
pub(super) fn subscriptions() -> Vec<(String, Vec<Argument>)> {
    ["plug", "slot"]
        .into_iter()
        .map(|channel| {
            (
                address::LISTEN.to_owned(),
                vec![Argument::from(channel), Argument::Bool(true)],
            )
        })
        .collect()
}
