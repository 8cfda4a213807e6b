use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use listenfd::ListenFd;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tracing::{info, warn};

use ota_types::ServerConfig;

/// Pending connections queued before devices see refusals.
const LISTEN_BACKLOG: i32 = 1024;

/// Why the server stopped accepting polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

/// Listener for the update server.
///
/// An fd handed over by systemd wins over `server_host:server_port`.
pub async fn create_listener(config: &ServerConfig) -> Result<TcpListener> {
    if let Some(listener) = inherited_listener()? {
        return Ok(listener);
    }

    let addr = bind_address(config)?;
    let listener = TcpListener::from_std(reuse_port_socket(addr)?.into())?;
    info!(%addr, "Listening for device polls (SO_REUSEPORT)");
    Ok(listener)
}

fn inherited_listener() -> Result<Option<TcpListener>> {
    let Some(std_listener) = ListenFd::from_env().take_tcp_listener(0)? else {
        return Ok(None);
    };
    std_listener.set_nonblocking(true)?;
    let listener = TcpListener::from_std(std_listener)?;
    info!(addr = ?listener.local_addr().ok(), "Using socket handed over by systemd");
    Ok(Some(listener))
}

fn bind_address(config: &ServerConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .server_host
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server_host))?;
    Ok(SocketAddr::new(ip, config.server_port))
}

fn reuse_port_socket(addr: SocketAddr) -> Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("Failed to bind {}", addr))?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket)
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed is
/// logged and never fires.
pub async fn shutdown_signal() -> ShutdownReason {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reason = tokio::select! {
        () = interrupt => ShutdownReason::Interrupt,
        () = terminate => ShutdownReason::Terminate,
    };
    info!(?reason, "Shutting down, finishing in-flight polls");
    reason
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> ServerConfig {
        let mut config = ServerConfig::new();
        config.server_host = host.to_string();
        config.server_port = port;
        config
    }

    #[test]
    fn test_bind_address_from_config() {
        assert_eq!(
            bind_address(&config("0.0.0.0", 5000)).unwrap(),
            "0.0.0.0:5000".parse::<SocketAddr>().unwrap()
        );
        assert!(bind_address(&config("::1", 8080)).unwrap().is_ipv6());

        let err = bind_address(&config("ota.local", 5000)).unwrap_err();
        assert!(err.to_string().contains("Invalid bind address 'ota.local'"));
    }

    #[tokio::test]
    async fn test_binds_ephemeral_port() {
        let listener = create_listener(&config("127.0.0.1", 0)).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
