use std::fmt;

use miette::{Diagnostic, ReportHandler};

use crate::error;

pub(crate) fn parse_jsonc<T>(str: &str) -> serde_json::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    // Strip comments **in place** so that any return error has the correct
    // codespans.
    let mut str = str.to_owned();
    json_strip_comments::strip_comments_in_place(&mut str, <_>::default(), true).ok();
    serde_json::from_str(&str)
}

pub struct LogStatus;

const _: () = {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};

    static HAS_ERROR: AtomicBool = AtomicBool::new(false);

    impl<S> Layer<S> for LogStatus
    where
        S: Subscriber,
    {
        fn on_event(&self, ev: &Event<'_>, _ctx: Context<'_, S>) {
            if ev.metadata().level() == &Level::ERROR {
                HAS_ERROR.store(true, Ordering::Release);
            }
        }
    }

    impl LogStatus {
        pub fn has_error() -> bool {
            HAS_ERROR.load(Ordering::Acquire)
        }
    }
};

macro_rules! __coloredmsg {
    ($fmt:literal.$color:ident, $($args:expr,)*) => {{
        let color = nu_ansi_term::Color::$color;
        eprintln!(concat!("{}", $fmt, "{}"), color.prefix() $(,$args)* ,color.suffix());
    }};
}

/// Prints an ERROR message.
macro_rules! msgerror {
    ($fmt:literal $(,$args:expr)* $(,)?) => {
        __coloredmsg!($fmt.Red, $($args,)*)
    };
}

/// Prints an INFO message.
macro_rules! msginfo {
    ($fmt:literal $(,$args:expr)* $(,)?) => {
        __coloredmsg!($fmt.Blue, $($args,)*)
    };
}

#[derive(Debug)]
pub struct ErrorWithSource<E = crate::error::Error>(pub E);

impl<E: std::error::Error> fmt::Display for ErrorWithSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(src) = self.0.source() {
            write!(f, "{}, {src}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl<E: std::error::Error> std::error::Error for ErrorWithSource<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Renders a diagnostic through a miette report handler.
pub(crate) struct DiagReporter<'a> {
    pub handler: &'a dyn ReportHandler,
    pub diag: &'a dyn Diagnostic,
}

impl fmt::Debug for DiagReporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.handler.debug(self.diag, f)
    }
}

#[extend::ext(pub, name = ResultExt)]
impl<T> error::Result<T> {
    fn ignore_interrupted(self) -> error::Result<Option<T>> {
        use error::Error::*;

        match self {
            Ok(t) => Ok(Some(t)),
            Err(Interrupted) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn log_error(self) -> Option<T> {
        use error::Error::*;

        match self {
            Ok(t) => Some(t),
            Err(Script(diag)) => {
                let handler = miette::MietteHandler::new();
                tracing::error!(
                    "{:?}",
                    DiagReporter {
                        handler: &handler,
                        diag: &*diag,
                    }
                );
                None
            }
            Err(e) => {
                tracing::error!("{}", ErrorWithSource(e));
                None
            }
        }
    }
}

#[cfg(test)]
macro_rules! jsonstr {
    ($tt:tt) => {
        stringify!($tt)
    };
}
