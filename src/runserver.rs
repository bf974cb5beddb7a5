//! Default `host:port` for a development server command

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Represents an error in parsing a `host:port` value.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AddrPortError {
    /// No `:` separating host and port
    #[error("expected host:port, got {0:?}")]
    MissingPort(String),
    /// Nothing before the `:`
    #[error("empty host in {0:?}")]
    EmptyHost(String),
    /// Port is not a number in `0..=65535`
    #[error("invalid port {port:?} in {value:?}")]
    InvalidPort {
        /// Full value given
        value: String,
        /// The part after the final `:`
        port: String,
    },
}

/// A host and port a development server should listen on,
/// e.g. `myproject.localhost:8000`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunserverOn {
    /// Host as written; IPv6 literals keep their brackets
    pub host: String,
    /// Port number
    pub port: u16,
}

impl RunserverOn {
    /// Returns the hostname, without brackets for IPv6 literals.
    pub fn hostname(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }
}

impl FromStr for RunserverOn {
    type Err = AddrPortError;

    fn from_str(s: &str) -> Result<RunserverOn, AddrPortError> {
        // the port follows the last colon outside of brackets
        let search_from = s.rfind(']').unwrap_or(0);
        let pos = match s[search_from..].rfind(':') {
            Some(pos) => search_from + pos,
            None => return Err(AddrPortError::MissingPort(s.to_owned())),
        };

        let (host, port) = (&s[..pos], &s[pos + 1..]);

        if host.is_empty() {
            return Err(AddrPortError::EmptyHost(s.to_owned()));
        }

        let port = port.parse().map_err(|_| AddrPortError::InvalidPort {
            value: s.to_owned(),
            port: port.to_owned(),
        })?;

        Ok(RunserverOn {
            host: host.to_owned(),
            port,
        })
    }
}

impl fmt::Display for RunserverOn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Options passed to a server command
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Options {
    /// Address and port to serve on, as given on the command line
    pub addrport: Option<String>,
    /// Remaining named options
    pub flags: BTreeMap<String, String>,
}

/// A command that runs with positional arguments and options.
pub trait Handle {
    /// Value produced by the command
    type Output;

    /// Runs the command.
    fn handle(&self, args: &[String], options: &mut Options) -> Self::Output;
}

impl<F, T> Handle for F
where
    F: Fn(&[String], &mut Options) -> T,
{
    type Output = T;

    fn handle(&self, args: &[String], options: &mut Options) -> T {
        self(args, options)
    }
}

/// Supplies the address used when a command is given none.
pub trait DefaultAddrport {
    /// Returns the default address, if one is configured.
    fn default_addrport(&self) -> Option<String>;
}

impl DefaultAddrport for RunserverOn {
    fn default_addrport(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl<P: DefaultAddrport> DefaultAddrport for Option<P> {
    fn default_addrport(&self) -> Option<String> {
        self.as_ref().and_then(|p| p.default_addrport())
    }
}

/// A command that fills in a default address before delegating.
///
/// Built by `with_default_addrport`.
#[derive(Clone, Debug)]
pub struct WithDefaultAddrport<H, P> {
    inner: H,
    policy: P,
}

/// Wraps `base` so that a missing or empty `addrport` option is replaced with
/// the address supplied by `policy`.
///
/// Arguments and every other option reach `base` unchanged, and its output is
/// returned as is. A whitespace-only address counts as given.
pub fn with_default_addrport<H, P>(base: H, policy: P) -> WithDefaultAddrport<H, P>
where
    H: Handle,
    P: DefaultAddrport,
{
    WithDefaultAddrport {
        inner: base,
        policy,
    }
}

impl<H: Handle, P: DefaultAddrport> WithDefaultAddrport<H, P> {
    /// Returns the wrapped command.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: Handle, P: DefaultAddrport> Handle for WithDefaultAddrport<H, P> {
    type Output = H::Output;

    fn handle(&self, args: &[String], options: &mut Options) -> H::Output {
        let unset = options.addrport.as_ref().map_or(true, |a| a.is_empty());

        if unset {
            if let Some(addr) = self.policy.default_addrport() {
                debug!("no address given; serving on {}", addr);
                options.addrport = Some(addr);
            }
        }

        self.inner.handle(args, options)
    }
}

#[cfg(test)]
mod test {
    use super::{with_default_addrport, AddrPortError, Handle, Options, RunserverOn};
    use std::cell::RefCell;

    fn run_on(s: &str) -> RunserverOn {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        let r = run_on("testproject.localhost:8000");
        assert_eq!(r.host, "testproject.localhost");
        assert_eq!(r.port, 8000);
        assert_eq!(r.hostname(), "testproject.localhost");

        let r = run_on("[::1]:8000");
        assert_eq!(r.host, "[::1]");
        assert_eq!(r.hostname(), "::1");
        assert_eq!(r.to_string(), "[::1]:8000");

        for s in &["localhost:8000", "0.0.0.0:8080", "myproject.local:3000", "192.168.1.100:8000"] {
            assert_eq!(run_on(s).to_string(), *s);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "localhost".parse::<RunserverOn>(),
            Err(AddrPortError::MissingPort("localhost".to_owned()))
        );
        assert_eq!(
            "[::1]".parse::<RunserverOn>(),
            Err(AddrPortError::MissingPort("[::1]".to_owned()))
        );
        assert_eq!(
            ":8000".parse::<RunserverOn>(),
            Err(AddrPortError::EmptyHost(":8000".to_owned()))
        );
        assert!("localhost:http".parse::<RunserverOn>().is_err());
        assert!("localhost:70000".parse::<RunserverOn>().is_err());
    }

    fn recording() -> (RefCell<Vec<Options>>, RunserverOn) {
        (RefCell::new(Vec::new()), run_on("testproject.localhost:8000"))
    }

    #[test]
    fn test_fills_missing_addrport() {
        let (seen, policy) = recording();
        let base = |_: &[String], opts: &mut Options| {
            seen.borrow_mut().push(opts.clone());
            "parent_result"
        };

        let cmd = with_default_addrport(base, policy);

        for addrport in vec![None, Some(String::new())] {
            let mut opts = Options {
                addrport,
                ..Options::default()
            };
            assert_eq!(cmd.handle(&[], &mut opts), "parent_result");
        }

        for opts in seen.borrow().iter() {
            assert_eq!(opts.addrport.as_deref(), Some("testproject.localhost:8000"));
        }
    }

    #[test]
    fn test_keeps_given_addrport() {
        let (seen, policy) = recording();
        let base = |_: &[String], opts: &mut Options| seen.borrow_mut().push(opts.clone());

        let cmd = with_default_addrport(base, policy);

        for given in &["0.0.0.0:8080", "   "] {
            let mut opts = Options {
                addrport: Some(given.to_string()),
                ..Options::default()
            };
            cmd.handle(&[], &mut opts);
        }

        let seen = seen.borrow();
        assert_eq!(seen[0].addrport.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(seen[1].addrport.as_deref(), Some("   "));
    }

    #[test]
    fn test_passes_args_and_flags() {
        let (seen, policy) = recording();
        let args = RefCell::new(Vec::new());
        let base = |a: &[String], opts: &mut Options| {
            args.borrow_mut().extend_from_slice(a);
            seen.borrow_mut().push(opts.clone());
        };

        let cmd = with_default_addrport(base, policy);

        let mut opts = Options::default();
        opts.flags.insert("use_reloader".to_owned(), "true".to_owned());
        opts.flags.insert("verbosity".to_owned(), "2".to_owned());
        cmd.handle(&["arg1".to_owned(), "arg2".to_owned()], &mut opts);

        assert_eq!(*args.borrow(), ["arg1", "arg2"]);
        let seen = seen.borrow();
        assert_eq!(seen[0].addrport.as_deref(), Some("testproject.localhost:8000"));
        assert_eq!(seen[0].flags["use_reloader"], "true");
        assert_eq!(seen[0].flags["verbosity"], "2");
    }

    #[test]
    fn test_no_default_configured() {
        let base = |_: &[String], opts: &mut Options| opts.addrport.clone();
        let cmd = with_default_addrport(base, None::<RunserverOn>);

        assert_eq!(cmd.handle(&[], &mut Options::default()), None);

        let mut opts = Options {
            addrport: Some("foo".to_owned()),
            ..Options::default()
        };
        assert_eq!(cmd.handle(&[], &mut opts).as_deref(), Some("foo"));
    }
}
