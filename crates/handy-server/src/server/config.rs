use anyhow::{Context, bail};
use clap::Parser;
use handy::RedirectMap;
use std::net::SocketAddr;

/// Runtime configuration for the `handy-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file in the working directory is loaded first), with defaults suitable for
/// running the server locally next to a test suite.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "handy-server",
    version,
    about = "An HTTP server for simulating slow, throttled, redirecting or failing upstreams"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Number of workers behind the `/pace` routes.
    ///
    /// At most this many `/pace` requests are processed at once; the rest wait
    /// in arrival order. A value of 0 is accepted and makes every `/pace`
    /// request hang, which is occasionally what a timeout test wants.
    ///
    /// Environment variable: `PACE_WORKERS`
    #[arg(long, env = "PACE_WORKERS", default_value_t = 1)]
    pub pace_workers: usize,

    /// Permanent redirects served for otherwise unrouted paths.
    ///
    /// Comma-separated `from=to` pairs, e.g. `/old=/new,/blog=https://blog.example.com`.
    ///
    /// Environment variable: `REDIRECTS`
    #[arg(long, env = "REDIRECTS", value_delimiter = ',', value_parser = parse_redirect)]
    pub redirects: Vec<(String, String)>,

    /// Largest request body accepted, in bytes. Larger bodies get a `413`.
    ///
    /// Environment variable: `MAX_BODY_BYTES`
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub pace_workers: usize,
    pub redirects: RedirectMap,
    pub max_body_bytes: usize,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr = args
            .server_addr
            .parse()
            .with_context(|| {
                format!("SERVER_ADDR ({}) is not a socket address", args.server_addr)
            })?;

        if args.max_body_bytes == 0 {
            bail!("MAX_BODY_BYTES must be greater than 0");
        }

        let mut redirects = RedirectMap::with_capacity(args.redirects.len());
        for (from, to) in args.redirects {
            if let Some(previous) = redirects.insert(from.clone(), to) {
                bail!("REDIRECTS maps {from} more than once (already to {previous})");
            }
        }

        Ok(Self {
            server_addr,
            pace_workers: args.pace_workers,
            redirects,
            max_body_bytes: args.max_body_bytes,
        })
    }
}

/// Parses one `from=to` redirect pair.
fn parse_redirect(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((from, to)) = raw.split_once('=') else {
        bail!("redirect {raw:?} is not of the form from=to");
    };
    let (from, to) = (from.trim(), to.trim());
    if !from.starts_with('/') {
        bail!("redirect source {from:?} must start with '/'");
    }
    if to.is_empty() {
        bail!("redirect target for {from:?} is empty");
    }
    Ok((from.to_string(), to.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = core::iter::once("handy-server").chain(args.iter().copied());
        let args = CliArgs::try_parse_from(argv)?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn defaults_are_valid() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.pace_workers, 1);
        assert!(config.redirects.is_empty());
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn parses_redirect_lists() {
        let config = parse(&[
            "--redirects",
            "/old=/new, /blog=https://blog.example.com/?a=b",
            "--pace-workers",
            "0",
        ])
        .unwrap();
        assert_eq!(config.pace_workers, 0);
        assert_eq!(config.redirects["/old"], "/new");
        assert_eq!(config.redirects["/blog"], "https://blog.example.com/?a=b");
    }

    #[test]
    fn rejects_invalid_values() {
        for args in [
            &["--server-addr", "localhost"][..],
            &["--max-body-bytes", "0"],
            &["--redirects", "/old"],
            &["--redirects", "old=/new"],
            &["--redirects", "/old="],
            &["--redirects", "/a=/b,/a=/c"],
        ] {
            assert!(parse(args).is_err(), "{args:?} should be rejected");
        }
    }
}
