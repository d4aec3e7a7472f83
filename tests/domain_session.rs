//! End-to-end test over the datagram-domain transport: rendezvous, a
//! legitimate request/reply round trip, and rejection of a spoofed sender.

use assuan_server::SessionContext;
use std::os::unix::net::UnixDatagram;
use std::thread;
use std::time::Duration;

fn client_rendezvous(rendezvous: &UnixDatagram, own_path: &std::path::Path) -> std::path::PathBuf {
    rendezvous.send(format!("{}\n", own_path.display()).as_bytes()).unwrap();
    let mut buf = [0u8; 512];
    let n = rendezvous.recv(&mut buf).unwrap();
    let line = String::from_utf8_lossy(&buf[..n]);
    std::path::PathBuf::from(line.trim_end_matches('\n'))
}

#[test]
fn spoofed_sender_is_silently_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let (server_rendezvous, client_rendezvous_sock) = UnixDatagram::pair().unwrap();

    let handle = thread::spawn(move || {
        use std::os::fd::IntoRawFd;
        let fd = server_rendezvous.into_raw_fd();
        let mut ctx = SessionContext::init_domain_server(fd, None).unwrap();
        let _ = ctx.process();
    });

    let legit_path = dir.path().join("legit.sock");
    let legit_socket = UnixDatagram::bind(&legit_path).unwrap();
    let server_path = client_rendezvous(&client_rendezvous_sock, &legit_path);

    let rogue_path = dir.path().join("rogue.sock");
    let rogue_socket = UnixDatagram::bind(&rogue_path).unwrap();
    rogue_socket.set_read_timeout(Some(Duration::from_millis(200))).unwrap();

    rogue_socket.send_to(b"NOP\n", &server_path).unwrap();
    let mut buf = [0u8; 64];
    let result = rogue_socket.recv(&mut buf);
    assert!(result.is_err(), "the server must not reply to an unexpected sender");

    legit_socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    legit_socket.send_to(b"NOP\n", &server_path).unwrap();
    let n = legit_socket.recv(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"OK\n");

    legit_socket.send_to(b"BYE\n", &server_path).unwrap();
    let n = legit_socket.recv(&mut buf).unwrap();
    assert!(buf[..n].starts_with(b"OK"));

    handle.join().unwrap();
}

/// Confirms the rendezvous handshake itself exchanges each side's bound path,
/// independent of the later datagram framing.
#[test]
fn rendezvous_path_is_learned_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = UnixDatagram::pair().unwrap();

    let path_a = dir.path().join("a.sock");
    let path_b = dir.path().join("b.sock");

    let path_b_clone = path_b.clone();
    let handle = thread::spawn(move || client_rendezvous(&b, &path_b_clone));

    let learned_b = client_rendezvous(&a, &path_a);
    let learned_a = handle.join().unwrap();

    assert_eq!(learned_b, path_b);
    assert_eq!(learned_a, path_a);
}
