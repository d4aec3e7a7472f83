//! End-to-end tests over a real pipe transport: a session thread running
//! `SessionContext::init_pipe_server` against two raw pipes, driven from
//! the test thread like a peer would.

use assuan_server::SessionContext;
use nix::unistd::{close, pipe, read as nix_read, write as nix_write};
use std::os::unix::io::RawFd;
use std::thread;

struct PipePeer {
    write_fd: RawFd,
    read_fd: RawFd,
}

impl PipePeer {
    fn send(&self, line: &str) {
        let mut buf = line.as_bytes().to_vec();
        buf.push(b'\n');
        nix_write(self.write_fd, &buf).unwrap();
    }

    fn recv_line(&self) -> String {
        let mut out = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = nix_read(self.read_fd, &mut byte).unwrap();
            assert_ne!(n, 0, "peer closed before a full line arrived");
            if byte[0] == b'\n' {
                break;
            }
            out.push(byte[0]);
        }
        String::from_utf8(out).unwrap()
    }
}

impl Drop for PipePeer {
    fn drop(&mut self) {
        let _ = close(self.write_fd);
        let _ = close(self.read_fd);
    }
}

/// Sets up a server thread and a client-side [`PipePeer`] wired to it.
fn spawn_session() -> (PipePeer, thread::JoinHandle<()>) {
    let (client_to_server_read, client_to_server_write) = pipe().unwrap();
    let (server_to_client_read, server_to_client_write) = pipe().unwrap();

    let handle = thread::spawn(move || {
        let mut ctx = SessionContext::init_pipe_server(client_to_server_read, server_to_client_write).unwrap();
        let _ = ctx.process();
    });

    let peer = PipePeer {
        write_fd: client_to_server_write,
        read_fd: server_to_client_read,
    };

    (peer, handle)
}

#[test]
fn nop_round_trips_a_single_ok() {
    let (peer, handle) = spawn_session();
    peer.send("NOP");
    assert_eq!(peer.recv_line(), "OK");
    peer.send("BYE");
    assert!(peer.recv_line().starts_with("OK"));
    drop(peer);
    handle.join().unwrap();
}

#[test]
fn comments_and_blank_lines_produce_no_extra_replies() {
    let (peer, handle) = spawn_session();
    nix_write(peer.write_fd, b"# a leading comment\n\nNOP\n").unwrap();
    assert_eq!(peer.recv_line(), "OK");
    peer.send("BYE");
    assert!(peer.recv_line().starts_with("OK"));
    drop(peer);
    handle.join().unwrap();
}

#[test]
fn unknown_command_is_reported_without_ending_the_session() {
    let (peer, handle) = spawn_session();
    peer.send("FROBNICATE");
    let reply = peer.recv_line();
    assert!(reply.starts_with("ERR 103"), "got: {reply}");
    peer.send("NOP");
    assert_eq!(peer.recv_line(), "OK");
    peer.send("BYE");
    assert!(peer.recv_line().starts_with("OK"));
    drop(peer);
    handle.join().unwrap();
}

#[test]
fn bye_ends_the_session_cleanly() {
    let (peer, handle) = spawn_session();
    peer.send("BYE");
    let reply = peer.recv_line();
    assert!(reply.starts_with("OK"));
    drop(peer);
    handle.join().unwrap();
}

#[test]
fn input_fd_with_garbage_is_a_syntax_error() {
    let (client_to_server_read, client_to_server_write) = nix::unistd::pipe().unwrap();
    let (server_to_client_read, server_to_client_write) = nix::unistd::pipe().unwrap();

    let handle = thread::spawn(move || {
        let mut ctx = SessionContext::init_pipe_server(client_to_server_read, server_to_client_write).unwrap();
        ctx.register(assuan_server::StdCommand::Input.id(), None, None).unwrap();
        let _ = ctx.process();
    });

    let peer = PipePeer {
        write_fd: client_to_server_write,
        read_fd: server_to_client_read,
    };

    peer.send("INPUT FD=12x");
    let reply = peer.recv_line();
    assert!(reply.starts_with("ERR 101"), "got: {reply}");

    peer.send("BYE");
    assert!(peer.recv_line().starts_with("OK"));
    drop(peer);
    handle.join().unwrap();
}

#[test]
fn reply_count_matches_request_count_plus_bye() {
    let (peer, handle) = spawn_session();
    for _ in 0..5 {
        peer.send("NOP");
        assert_eq!(peer.recv_line(), "OK");
    }
    peer.send("BYE");
    assert!(peer.recv_line().starts_with("OK"));
    drop(peer);
    handle.join().unwrap();
}
