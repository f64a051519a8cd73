// Local IPv4 address lookup for a named network interface
use crate::application::metrics_source::AddressResolver;
use if_addrs::{get_if_addrs, IfAddr, Interface};
use std::net::Ipv4Addr;

#[derive(Debug, Clone)]
pub struct InterfaceResolver {
    interface: String,
}

impl InterfaceResolver {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

impl AddressResolver for InterfaceResolver {
    fn local_address(&self) -> Option<Ipv4Addr> {
        match get_if_addrs() {
            Ok(interfaces) => {
                let address = first_ipv4(&interfaces, &self.interface);
                if address.is_none() {
                    tracing::warn!("No IPv4 address on interface {}", self.interface);
                }
                address
            }
            Err(e) => {
                tracing::warn!("Failed to enumerate network interfaces: {}", e);
                None
            }
        }
    }
}

fn first_ipv4(interfaces: &[Interface], name: &str) -> Option<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|iface| iface.name == name)
        .find_map(|iface| match &iface.addr {
            IfAddr::V4(v4) => Some(v4.ip),
            IfAddr::V6(_) => None,
        })
}
