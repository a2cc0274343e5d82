use std::io::Cursor;

use anyhow::anyhow;
use log::{debug, info, warn};
use tiny_http::{Header, Response, Server, StatusCode};

fn html_response(body: &str) -> anyhow::Result<Response<Cursor<Vec<u8>>>> {
    let bytes = body.as_bytes().to_vec();
    let len = bytes.len();
    let content_type = Header::from_bytes(b"Content-Type", b"text/html; charset=utf-8")
        .map_err(|_| anyhow!("invalid Content-Type header"))?;
    Ok(Response::new(StatusCode(200), vec![content_type], Cursor::new(bytes), Some(len), None))
}

fn not_found() -> Response<Cursor<Vec<u8>>> {
    Response::from_string("not found").with_status_code(StatusCode(404))
}

/// Serves `page` at `/` until the process is killed.
///
/// Requests are answered one at a time on the calling thread.
pub fn serve(addr: &str, page: &str, open_browser: bool) -> anyhow::Result<()> {
    let server = Server::http(addr).map_err(|e| anyhow!("failed to bind {}: {}", addr, e))?;
    let url = format!("http://{}/", addr);
    info!("Serving comparison chart at {}", url);

    if open_browser {
        if let Err(e) = open::that(&url) {
            warn!("could not open a browser: {}", e);
        }
    }

    for request in server.incoming_requests() {
        let url = request.url().to_string();
        debug!("{} {}", request.method(), url);
        let result = match url.as_str() {
            "/" | "/index.html" => request.respond(html_response(page)?),
            _ => request.respond(not_found()),
        };
        if let Err(e) = result {
            warn!("failed to send response: {}", e);
        }
    }
    Ok(())
}
