use anyhow::Context;
use clap::Parser;
use meridian_dns_application::use_cases::ResolveNameUseCase;
use meridian_dns_domain::config::CliOverrides;
use meridian_dns_domain::{Domain, Query, QueryFlags, RecordClass, RecordType};
use meridian_dns_infrastructure::dns::ResolverBuilder;
use std::net::IpAddr;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

mod bootstrap;

#[derive(Parser)]
#[command(name = "meridian-dns")]
#[command(version)]
#[command(about = "Meridian DNS - iterative and forwarding DNS lookups")]
struct Cli {
    /// Name to look up, or an IP address with --reverse
    name: String,

    /// Record type (A, AAAA, MX, NS, SOA, TXT, ANY, ...)
    #[arg(default_value = "A")]
    record_type: String,

    /// Record class
    #[arg(long, default_value = "IN")]
    class: String,

    /// Forward to this server instead of resolving iteratively
    #[arg(short = 's', long, value_name = "ADDR")]
    server: Option<String>,

    /// Neither read nor populate the cache
    #[arg(long)]
    no_cache: bool,

    /// Skip the hosts file
    #[arg(long)]
    no_hosts: bool,

    /// Clear the recursion-desired bit; iterative lookups then answer NXDOMAIN
    #[arg(long)]
    no_recurse: bool,

    /// Treat the name as an address and query its PTR record
    #[arg(short = 'x', long)]
    reverse: bool,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn query(&self) -> anyhow::Result<Query> {
        let (domain, record_type) = if self.reverse {
            let address: IpAddr = self
                .name
                .parse()
                .with_context(|| format!("'{}' is not an IP address", self.name))?;
            (Domain::reverse_arpa(address), RecordType::PTR)
        } else {
            let domain: Domain = self
                .name
                .parse()
                .with_context(|| format!("invalid domain name '{}'", self.name))?;
            let record_type = self
                .record_type
                .parse::<RecordType>()
                .map_err(|e| anyhow::anyhow!(e))?;
            (domain, record_type)
        };

        let class = self
            .class
            .parse::<RecordClass>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let mut flags = QueryFlags::NONE;
        if self.no_cache {
            flags |= QueryFlags::BYPASS_CACHE;
        }
        if self.no_recurse {
            flags |= QueryFlags::NO_RECURSION;
        }

        Ok(Query::new(domain, record_type)
            .with_class(class)
            .with_flags(flags))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        forward_server: cli.server.clone(),
        cache_enabled: cli.no_cache.then_some(false),
        hosts_enabled: cli.no_hosts.then_some(false),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting Meridian DNS v{}", env!("CARGO_PKG_VERSION"));
    bootstrap::log_config_summary(&config);

    let query = cli.query()?;
    let timeout = Duration::from_millis(config.resolver.query_timeout_ms);

    let resolver = ResolverBuilder::new(Handle::current())
        .with_config(config)
        .build()?;
    let use_case = ResolveNameUseCase::new(resolver, timeout);

    debug!(query = %query, "Resolving");
    let answer = use_case
        .execute(&query)
        .await
        .with_context(|| format!("lookup of {} failed", query.domain))?;

    print!("{}", answer);

    if !answer.result_code().is_success() {
        anyhow::bail!("{} {}: {}", query.domain, query.record_type, answer.result_code());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("meridian-dns").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_to_a_in() {
        let query = parse(&["example.com"]).query().unwrap();
        assert_eq!(query.record_type, RecordType::A);
        assert_eq!(query.class, RecordClass::IN);
        assert!(query.flags.is_empty());
    }

    #[test]
    fn test_reverse_builds_ptr_query() {
        let query = parse(&["-x", "192.0.2.1"]).query().unwrap();
        assert_eq!(query.record_type, RecordType::PTR);
        assert_eq!(query.domain.to_string(), "1.2.0.192.in-addr.arpa");
    }

    #[test]
    fn test_flags_from_switches() {
        let query = parse(&["example.com", "MX", "--no-cache", "--no-recurse"])
            .query()
            .unwrap();
        assert_eq!(query.record_type, RecordType::MX);
        assert!(query.has_flag(QueryFlags::BYPASS_CACHE));
        assert!(query.has_flag(QueryFlags::NO_RECURSION));
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(parse(&["example.com", "BOGUS"]).query().is_err());
    }
}
