//! Integration tests for message submission.
//!
//! A scripted relay on a loopback socket answers the client and records
//! every line it receives.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use latemail_smtp::{Address, Error, Relay, TlsPolicy, send_mail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Starts a relay that accepts one connection.
///
/// Recipients containing `nobody` are refused with 550, and the final DATA
/// reply is `data_reply`.
async fn scripted_relay(data_reply: &'static str) -> (Relay, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut transcript = Vec::new();

        write
            .write_all(b"220 relay.test ESMTP ready\r\n")
            .await
            .unwrap();

        while let Ok(Some(line)) = lines.next_line().await {
            transcript.push(line.clone());
            let reply: &[u8] = if line.starts_with("EHLO") {
                b"250-relay.test greets you\r\n250-SIZE 10000\r\n250 8BITMIME\r\n"
            } else if line.starts_with("MAIL FROM") {
                b"250 OK\r\n"
            } else if line.starts_with("RCPT TO") {
                if line.contains("nobody") {
                    b"550 No such user here\r\n"
                } else {
                    b"250 OK\r\n"
                }
            } else if line == "DATA" {
                write.write_all(b"354 End data with .\r\n").await.unwrap();
                while let Ok(Some(data)) = lines.next_line().await {
                    let done = data == ".";
                    transcript.push(data);
                    if done {
                        break;
                    }
                }
                data_reply.as_bytes()
            } else if line == "QUIT" {
                write.write_all(b"221 Bye\r\n").await.unwrap();
                break;
            } else {
                b"502 Command not implemented\r\n"
            };
            write.write_all(reply).await.unwrap();
        }

        transcript
    });

    (Relay::new("127.0.0.1", port), handle)
}

fn addresses(raw: &[&str]) -> Vec<Address> {
    raw.iter().map(|a| Address::new(*a).unwrap()).collect()
}

#[tokio::test]
async fn delivers_to_every_recipient() {
    let (relay, server) = scripted_relay("250 Queued as 42\r\n").await;
    let from = Address::new("me@example.com").unwrap();
    let to = addresses(&["you@example.com", "cc@example.com"]);
    let message = b"Subject: Hello\r\n\r\nFirst line\n.hidden dot\nLast line\n";

    send_mail(&relay, &from, &to, message, TlsPolicy::Verified)
        .await
        .unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript[0], "EHLO localhost");
    assert_eq!(transcript[1], "MAIL FROM:<me@example.com> BODY=8BITMIME");
    assert_eq!(transcript[2], "RCPT TO:<you@example.com>");
    assert_eq!(transcript[3], "RCPT TO:<cc@example.com>");
    assert_eq!(transcript[4], "DATA");
    assert!(transcript.contains(&"..hidden dot".to_string()));
    assert!(transcript.contains(&"Last line".to_string()));
    assert_eq!(transcript.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn refused_recipient_fails_the_whole_message() {
    let (relay, server) = scripted_relay("250 OK\r\n").await;
    let from = Address::new("me@example.com").unwrap();
    let to = addresses(&["you@example.com", "nobody@example.com"]);

    let err = send_mail(&relay, &from, &to, b"Subject: x\r\n\r\nbody\r\n", TlsPolicy::Verified)
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert!(err.to_string().contains("No such user here"));

    let transcript = server.await.unwrap();
    assert!(!transcript.contains(&"DATA".to_string()));
}

#[tokio::test]
async fn rejected_data_is_reported() {
    let (relay, _server) = scripted_relay("554 Message looks like spam\r\n").await;
    let from = Address::new("me@example.com").unwrap();
    let to = addresses(&["you@example.com"]);

    let err = send_mail(&relay, &from, &to, b"Subject: x\r\n\r\nbody\r\n", TlsPolicy::Verified)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SmtpError { code: 554, .. }));
}

#[tokio::test]
async fn oversized_message_is_refused_before_mail_from() {
    let (relay, server) = scripted_relay("250 OK\r\n").await;
    let from = Address::new("me@example.com").unwrap();
    let to = addresses(&["you@example.com"]);
    let message = vec![b'x'; 20_000];

    let err = send_mail(&relay, &from, &to, &message, TlsPolicy::Verified)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));

    let transcript = server.await.unwrap();
    assert_eq!(transcript, vec!["EHLO localhost".to_string()]);
}

#[tokio::test]
async fn no_recipients_never_connects() {
    let relay = Relay::new("127.0.0.1", 1);
    let from = Address::new("me@example.com").unwrap();

    let err = send_mail(&relay, &from, &[], b"", TlsPolicy::AcceptInvalidCertificates)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoRecipients));
}
