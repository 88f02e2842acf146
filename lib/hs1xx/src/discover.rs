use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use if_addrs::IfAddr;
use log::{debug, info, trace, warn};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};

use crate::codec::{self, Framing};
use crate::reply::{self, DeviceInfo};
use crate::transport::PORT;

pub const DISCOVERY_WINDOW: Duration = Duration::from_millis(2000);

const DISCOVERY_QUERY: &[u8] = br#"{"system":{"get_sysinfo":{}}}"#;

/// Which local interface the broadcast goes out of.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Interface {
    /// The interface carrying the default route, or else the first
    /// non-loopback interface with an IPv4 address.
    #[default]
    Any,
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalNetwork {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl LocalNetwork {
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.ip) | !u32::from(self.netmask))
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.netmask);
        u32::from(self.ip) & mask == u32::from(ip) & mask
    }
}

pub fn local_network(interface: &Interface) -> Option<LocalNetwork> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(err) => {
            warn!("unable to list network interfaces: {err}");
            return None;
        }
    };

    let candidates = interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(addr) => Some((
                iface.name,
                LocalNetwork {
                    ip: addr.ip,
                    netmask: addr.netmask,
                },
            )),
            IfAddr::V6(_) => None,
        })
        .collect();

    let route_ip = match interface {
        Interface::Any => default_route_ip(),
        Interface::Named(_) => None,
    };

    select_network(candidates, interface, route_ip)
}

fn select_network(
    candidates: Vec<(String, LocalNetwork)>,
    interface: &Interface,
    route_ip: Option<Ipv4Addr>,
) -> Option<LocalNetwork> {
    match interface {
        Interface::Named(name) => candidates
            .into_iter()
            .find(|(iface, _)| iface == name)
            .map(|(_, network)| network),
        Interface::Any => {
            let routed = route_ip.and_then(|ip| {
                candidates
                    .iter()
                    .find(|(_, network)| network.ip == ip)
                    .or_else(|| candidates.iter().find(|(_, network)| network.contains(ip)))
            });

            if let Some((name, network)) = routed {
                debug!("using {name}, it carries the default route");
                return Some(*network);
            }

            candidates.into_iter().next().map(|(_, network)| network)
        }
    }
}

/// Local address the kernel picks for outbound traffic. Connecting a UDP
/// socket only consults the routing table, nothing is sent.
fn default_route_ip() -> Option<Ipv4Addr> {
    let socket = std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 53)).ok()?;

    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) if !addr.ip().is_unspecified() => Some(*addr.ip()),
        _ => None,
    }
}

/// Broadcasts a sysinfo query on the subnet of `interface` and collects the
/// replies that arrive within `window`. Never fails: unreachable networks and
/// devices that answer gibberish simply produce fewer entries.
pub async fn discover(interface: &Interface, window: Duration) -> HashMap<Ipv4Addr, DeviceInfo> {
    let network = match local_network(interface) {
        Some(network) => network,
        None => {
            warn!("no IPv4 address found for {interface:?}");
            return HashMap::new();
        }
    };

    let broadcast = network.broadcast();
    info!("discovering plugs via {broadcast} from {}", network.ip);

    match collect_replies(broadcast, window).await {
        Ok(replies) => parse_replies(replies, network.ip),
        Err(err) => {
            warn!("discovery failed: {err}");
            HashMap::new()
        }
    }
}

async fn collect_replies(
    broadcast: Ipv4Addr,
    window: Duration,
) -> std::io::Result<HashMap<Ipv4Addr, Vec<u8>>> {
    let socket = bind_socket()?;

    let query = codec::encode(DISCOVERY_QUERY, Framing::Datagram);
    socket
        .send_to(&query, SocketAddrV4::new(broadcast, PORT))
        .await?;
    trace!("sent discovery query to {broadcast}");

    let deadline = Instant::now() + window;
    let mut replies = HashMap::new();
    let mut buffer = [0; 4096];

    loop {
        match time::timeout_at(deadline, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, SocketAddr::V4(source)))) => {
                trace!("{size} bytes from {source}");
                replies
                    .entry(*source.ip())
                    .or_insert_with(|| buffer[..size].to_vec());
            }
            Ok(Ok((_, source))) => trace!("ignored reply from {source}"),
            Ok(Err(err)) => {
                debug!("discovery receive error: {err}");
                break;
            }
            Err(_) => break,
        }
    }

    drop(socket);
    debug!("discovery window closed with {} replies", replies.len());

    Ok(replies)
}

fn bind_socket() -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;

    let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, PORT);
    socket.bind(&SockAddr::from(address))?;

    UdpSocket::from_std(socket.into())
}

fn parse_replies(
    replies: HashMap<Ipv4Addr, Vec<u8>>,
    local_ip: Ipv4Addr,
) -> HashMap<Ipv4Addr, DeviceInfo> {
    replies
        .into_iter()
        .filter(|(ip, _)| *ip != local_ip)
        .filter_map(|(ip, datagram)| {
            let payload = codec::decode(&datagram, Framing::Datagram);

            match reply::parse::<DeviceInfo>("system", "get_sysinfo", &payload) {
                Ok(info) => Some((ip, info)),
                Err(err) => {
                    trace!("{ip} is not a compatible device: {err}");
                    None
                }
            }
        })
        .collect()
}
