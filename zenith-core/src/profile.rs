use log::info;

/// Keeps the puffin capture server alive; captures stop when dropped.
pub struct ProfilerServer {
    _server: puffin_http::Server,
}

/// Turn on profiling scopes and serve captures on the default puffin port.
pub fn initialize() -> Result<ProfilerServer, anyhow::Error> {
    profiling::puffin::set_scopes_on(true);

    let server_addr = format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT);
    let server = puffin_http::Server::new(&server_addr)?;
    info!("Serving profiler captures on {server_addr}");

    Ok(ProfilerServer { _server: server })
}

/// Mark the end of a frame for the profiler.
#[inline]
pub fn finish_frame() {
    profiling::finish_frame!();
}
