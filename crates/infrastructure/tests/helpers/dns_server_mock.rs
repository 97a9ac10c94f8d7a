#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use hickory_proto::serialize::binary::BinEncodable;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// What the mock nameserver does with every query it receives.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Answer(Ipv4Addr),
    NxDomain,
    ServFail,
    /// UDP replies carry TC and no answers; the TCP listener answers fully.
    Truncate(Ipv4Addr),
    Silent,
}

/// UDP (and TCP, same port) nameserver on 127.0.0.1.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<Mutex<Vec<String>>>,
    tcp_queries: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(behavior: Behavior) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let listener = TcpListener::bind(addr).await?;

        let queries = Arc::new(Mutex::new(Vec::new()));
        let tcp_queries = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let udp_log = queries.clone();
        let tcp_log = tcp_queries.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            record(&udp_log, &buf[..len]);
                            if let Some(response) = build_response(&buf[..len], behavior, false) {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                    accepted = listener.accept() => {
                        if let Ok((stream, _)) = accepted {
                            tokio::spawn(serve_tcp(stream, behavior, tcp_log.clone()));
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            tcp_queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Query names received over UDP, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn tcp_queries(&self) -> Vec<String> {
        self.tcp_queries.lock().unwrap().clone()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_tcp(
    mut stream: tokio::net::TcpStream,
    behavior: Behavior,
    log: Arc<Mutex<Vec<String>>>,
) {
    let mut length = [0u8; 2];
    if stream.read_exact(&mut length).await.is_err() {
        return;
    }
    let mut query = vec![0u8; u16::from_be_bytes(length) as usize];
    if stream.read_exact(&mut query).await.is_err() {
        return;
    }
    record(&log, &query);

    if let Some(response) = build_response(&query, behavior, true) {
        let _ = stream
            .write_all(&(response.len() as u16).to_be_bytes())
            .await;
        let _ = stream.write_all(&response).await;
    }
}

fn record(log: &Mutex<Vec<String>>, query: &[u8]) {
    if let Ok(message) = Message::from_vec(query) {
        if let Some(q) = message.queries().first() {
            log.lock().unwrap().push(q.name().to_string());
        }
    }
}

pub fn build_response(query: &[u8], behavior: Behavior, over_tcp: bool) -> Option<Vec<u8>> {
    let request = Message::from_vec(query).ok()?;
    let question = request.queries().first()?.clone();

    let mut response = Message::new();
    response.set_id(request.id());
    response.set_message_type(MessageType::Response);
    response.set_op_code(OpCode::Query);
    response.set_recursion_desired(request.recursion_desired());
    response.set_recursion_available(true);
    response.add_query(question.clone());

    let answer = |ip: Ipv4Addr| Record::from_rdata(question.name().clone(), 60, RData::A(A(ip)));
    match behavior {
        Behavior::Answer(ip) => {
            response.add_answer(answer(ip));
        }
        Behavior::NxDomain => {
            response.set_response_code(ResponseCode::NXDomain);
        }
        Behavior::ServFail => {
            response.set_response_code(ResponseCode::ServFail);
        }
        Behavior::Truncate(ip) if over_tcp => {
            response.add_answer(answer(ip));
        }
        Behavior::Truncate(_) => {
            response.set_truncated(true);
        }
        Behavior::Silent => return None,
    }

    response.to_vec().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts_on_ephemeral_port() {
        let server = MockDnsServer::start(Behavior::Silent).await.unwrap();

        assert!(server.addr().ip().is_loopback());
        assert_ne!(server.addr().port(), 0);

        server.shutdown();
    }

    #[test]
    fn test_garbage_query_gets_no_response() {
        assert!(build_response(&[0x12, 0x34], Behavior::NxDomain, false).is_none());
    }
}
