pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
pub use paste::paste;
pub use thiserror::Error;

pub type EmptyResult = anyhow::Result<()>;

// Frames whose location contains any of these come from the toolchain or the async runtime, and
// aren't interesting when a scenario blows up.
const SKIPPED_FRAME_MARKERS: [&str; 4] = ["/rustc/", "/.cargo/registry/", "/.build/", "glibc"];

// This macro creates an enum which derives from thiserror::Error, and also
// creates constructor functions in snake case for each of the enum variants
#[macro_export]
macro_rules! err_impl {
    (@hidden $errtype:ident, $item:ident, String) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &str) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.into())}
            }
        }
    };

    (@hidden $errtype:ident, $item:ident, $($dtype:tt)::+) => {
        paste! {
            pub(crate) fn [<$item:snake>](in_: &$($dtype)::+) -> anyhow::Error {
                anyhow!{$errtype::$item(in_.clone())}
            }
        }
    };

    ($errtype:ident,
        $(#[$errinfo:meta] $item:ident($($dtype:tt)::+),)+
    ) => {
        #[derive(Debug, Error)]
        pub(crate) enum $errtype {
            $(#[$errinfo] $item($($dtype)::+)),+
        }

        impl $errtype {
            $(err_impl! {@hidden $errtype, $item, $($dtype)::+})+
        }
    };
}

// Log an anyhow error with its full context chain and the part of its backtrace that points at our
// own code.  Only meant for the "we're about to give up" paths; computing the backtrace is slow.
#[macro_export]
macro_rules! kwerr {
    ($err:expr, $msg:literal) => {
        $crate::kwerr!($err, $msg,)
    };

    ($err:expr, $msg:literal, $($args:expr),* $(,)?) => {{
        let err: &anyhow::Error = &$err;
        ::tracing::error!(
            concat!($msg, "\n\n{:#}\n\nPartial Stack Trace:\n\n{}\n") $(, $args)*,
            err,
            $crate::errors::pruned_backtrace(err),
        );
    }};
}

pub fn pruned_backtrace(err: &anyhow::Error) -> String {
    let bt = err.backtrace().to_string();
    let Ok(frame_re) = regex::RegexBuilder::new(r"^\s+\d+(?s:.*?)(\s+at\s+.*:\d+)$")
        .multi_line(true)
        .build()
    else {
        return bt;
    };

    let mut skipped = 0;
    let mut out = String::new();
    for frame in frame_re.find_iter(&bt).map(|m| m.as_str()) {
        if SKIPPED_FRAME_MARKERS.iter().any(|marker| frame.contains(marker)) {
            skipped += 1;
        } else if !frame.is_empty() {
            flush_skipped(&mut out, &mut skipped);
            out.push_str(frame);
            out.push('\n');
        }
    }
    flush_skipped(&mut out, &mut skipped);
    out
}

fn flush_skipped(out: &mut String, skipped: &mut usize) {
    match *skipped {
        0 => (),
        1 => out.push_str("      -- <skipped 1 frame> --\n"),
        n => out.push_str(&format!("      -- <skipped {n} frames> --\n")),
    }
    *skipped = 0;
}

pub use {
    err_impl,
    kwerr,
};
