//! Minimal sprig example: JSON echo, middleware, groups and cookies.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/?name=alice
//!   curl -X POST http://localhost:3000/echo \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -i http://localhost:3000/login
//!   curl -i --cookie session=abc http://localhost:3000/admin/dashboard/stats
//!   curl -i http://localhost:3000/admin

use sprig::{App, CookieOptions, Next, Request, Response, SameSite, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    App::new()
        .middleware("*", log_request)
        .middleware("/admin", require_session)
        .get("/", hello)
        .post("/echo", echo)
        .get("/login", login)
        .get("/logout", logout)
        .group("/admin", |admin| {
            admin
                .get("/", admin_home)
                .group("/dashboard", |dashboard| dashboard.get("/stats", stats))
        })
        .listen_with(3000, "0.0.0.0", |addr| tracing::info!(%addr, "ready"))
        .await
        .expect("server error");
}

async fn log_request(req: Request, _res: Response, next: Next) {
    tracing::info!(method = %req.method(), path = req.path(), "request");
    next.run().await;
}

// Without a session cookie the chain stops here and the route never runs.
async fn require_session(req: Request, res: Response, next: Next) {
    if req.cookie("session").is_some() {
        next.run().await;
    } else {
        res.send_status("Forbidden", StatusCode::FORBIDDEN);
    }
}

// GET /?name=alice
async fn hello(req: Request, res: Response) {
    let name = req.query("name").unwrap_or("world");
    res.send(format!("Hello, {name}!"));
}

// POST /echo: JSON in, JSON out. Plain text comes back as plain text.
async fn echo(req: Request, res: Response) {
    res.send(req.body().clone());
}

async fn login(_req: Request, res: Response) {
    let opts = CookieOptions::new()
        .path("/")
        .max_age(60 * 60)
        .http_only()
        .same_site(SameSite::Lax);

    if let Err(e) = res.set_cookie_with("session", "abc", &opts) {
        tracing::error!("{e}");
    }
    res.send("logged in");
}

async fn logout(_req: Request, res: Response) {
    if let Err(e) = res.clear_cookie_with("session", &CookieOptions::new().path("/")) {
        tracing::error!("{e}");
    }
    res.send("logged out");
}

async fn admin_home(_req: Request, res: Response) {
    res.send("Hello, Admin!");
}

async fn stats(_req: Request, res: Response) {
    res.send(serde_json::json!({ "visits": 10 }));
}
