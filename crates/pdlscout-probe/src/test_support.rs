// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local HTTP fixtures for probe tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A request captured by [`serve_once`].
pub struct CapturedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

/// Accept a single connection on an ephemeral port, capture the request and
/// answer with `response` verbatim. Returns the port and the captured request.
pub async fn serve_once(response: Vec<u8>) -> (u16, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut buf).await.expect("read");
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&data[..header_end]).to_string();
        let content_length = head
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with("content-length:"))
            .and_then(|line| line.split(':').nth(1))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while data.len() < header_end + content_length {
            let n = stream.read(&mut buf).await.expect("read body");
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
        }

        stream.write_all(&response).await.expect("write");
        stream.shutdown().await.ok();

        let body = data[header_end..].to_vec();
        tx.send(CapturedRequest { head, body }).ok();
    });

    (port, rx)
}

/// A complete `200 OK` response with the given content type and body.
pub fn http_ok(content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// A port on which nothing is listening.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

/// What the fake SNMP agent answers to one get-next request.
#[cfg(feature = "snmp")]
pub enum AgentReply {
    /// The next binding: dotted OID and an OCTET STRING value.
    Next(String, String),
    /// A non-zero SNMPv1 error-status, echoing the requested OID.
    Status(u8),
}

/// Start a UDP SNMPv1 agent that answers every get-next with
/// `respond(requested_oid)`. The agent stops after a second of silence.
#[cfg(feature = "snmp")]
pub fn spawn_agent<F>(respond: F) -> u16
where
    F: Fn(&str) -> AgentReply + Send + 'static,
{
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind agent");
    socket
        .set_read_timeout(Some(std::time::Duration::from_secs(1)))
        .expect("read timeout");
    let port = socket.local_addr().expect("agent addr").port();

    std::thread::spawn(move || {
        let mut buf = [0u8; 1500];
        while let Ok((n, peer)) = socket.recv_from(&mut buf) {
            let Some(request) = ber::GetNext::decode(&buf[..n]) else {
                continue;
            };
            let reply = respond(&request.oid);
            socket
                .send_to(&request.respond(&reply), peer)
                .expect("agent send");
        }
    });

    port
}

/// Just enough BER to decode a get-next request and encode its response.
#[cfg(feature = "snmp")]
mod ber {
    use super::AgentReply;

    const SEQUENCE: u8 = 0x30;
    const INTEGER: u8 = 0x02;
    const OCTET_STRING: u8 = 0x04;
    const NULL: u8 = 0x05;
    const OBJECT_IDENTIFIER: u8 = 0x06;
    const GET_RESPONSE: u8 = 0xA2;

    pub struct GetNext {
        version: Vec<u8>,
        community: Vec<u8>,
        request_id: Vec<u8>,
        pub oid: String,
    }

    impl GetNext {
        pub fn decode(packet: &[u8]) -> Option<Self> {
            let (_, message, _) = tlv(packet)?;
            let (_, _, version_len) = tlv(message)?;
            let rest = &message[version_len..];
            let (_, _, community_len) = tlv(rest)?;
            let (_, pdu, _) = tlv(&rest[community_len..])?;

            let (_, _, id_len) = tlv(pdu)?;
            let mut at = id_len;
            // error-status, error-index
            for _ in 0..2 {
                let (_, _, len) = tlv(pdu.get(at..)?)?;
                at += len;
            }
            let (_, varbinds, _) = tlv(pdu.get(at..)?)?;
            let (_, varbind, _) = tlv(varbinds)?;
            let (tag, oid, _) = tlv(varbind)?;
            if tag != OBJECT_IDENTIFIER {
                return None;
            }

            Some(Self {
                version: message[..version_len].to_vec(),
                community: rest[..community_len].to_vec(),
                request_id: pdu[..id_len].to_vec(),
                oid: decode_oid(oid)?,
            })
        }

        pub fn respond(&self, reply: &AgentReply) -> Vec<u8> {
            let (status, index, varbind) = match reply {
                AgentReply::Next(oid, value) => (
                    0,
                    0,
                    [
                        encode(OBJECT_IDENTIFIER, &encode_oid(oid)),
                        encode(OCTET_STRING, value.as_bytes()),
                    ]
                    .concat(),
                ),
                AgentReply::Status(status) => (
                    *status,
                    1,
                    [encode(OBJECT_IDENTIFIER, &encode_oid(&self.oid)), encode(NULL, &[])].concat(),
                ),
            };
            let varbinds = encode(SEQUENCE, &encode(SEQUENCE, &varbind));
            let pdu = [
                self.request_id.clone(),
                encode(INTEGER, &[status]),
                encode(INTEGER, &[index]),
                varbinds,
            ]
            .concat();
            let message = [
                self.version.clone(),
                self.community.clone(),
                encode(GET_RESPONSE, &pdu),
            ]
            .concat();
            encode(SEQUENCE, &message)
        }
    }

    /// Split off one TLV: `(tag, contents, encoded length)`.
    fn tlv(buf: &[u8]) -> Option<(u8, &[u8], usize)> {
        let tag = *buf.first()?;
        let first = *buf.get(1)? as usize;
        let (len, header) = if first < 0x80 {
            (first, 2)
        } else {
            let n = first & 0x7f;
            let len = buf
                .get(2..2 + n)?
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | *b as usize);
            (len, 2 + n)
        };
        Some((tag, buf.get(header..header + len)?, header + len))
    }

    fn encode(tag: u8, contents: &[u8]) -> Vec<u8> {
        let len = contents.len();
        let mut out = vec![tag];
        if len < 0x80 {
            out.push(len as u8);
        } else if len < 0x100 {
            out.extend_from_slice(&[0x81, len as u8]);
        } else {
            out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
        }
        out.extend_from_slice(contents);
        out
    }

    fn decode_oid(bytes: &[u8]) -> Option<String> {
        let (first, rest) = bytes.split_first()?;
        let mut arcs = vec![u64::from(first / 40), u64::from(first % 40)];
        let mut arc = 0u64;
        for b in rest {
            arc = (arc << 7) | u64::from(b & 0x7f);
            if b & 0x80 == 0 {
                arcs.push(arc);
                arc = 0;
            }
        }
        Some(
            arcs.iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    fn encode_oid(dotted: &str) -> Vec<u8> {
        let arcs: Vec<u64> = dotted
            .split('.')
            .map(|arc| arc.parse().expect("numeric arc"))
            .collect();
        let mut out = vec![(arcs[0] * 40 + arcs[1]) as u8];
        for &arc in &arcs[2..] {
            let mut chunk = vec![(arc & 0x7f) as u8];
            let mut rest = arc >> 7;
            while rest > 0 {
                chunk.push(((rest & 0x7f) as u8) | 0x80);
                rest >>= 7;
            }
            chunk.reverse();
            out.extend(chunk);
        }
        out
    }
}
