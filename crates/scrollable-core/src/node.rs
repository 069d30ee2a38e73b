#![forbid(unsafe_code)]

//! Opaque handles for host-owned resources.
//!
//! Every handle is a plain integer minted by the host. Hosts never reuse a
//! value, so two handles compare equal only when they name the same
//! resource instance.

use core::fmt;

macro_rules! host_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw host-assigned value.
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw host-assigned value.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

host_handle!(
    /// A node in the host document.
    ///
    /// Identity is the only thing a `NodeRef` carries. A re-rendered part
    /// that the rendering engine had to recreate resolves to a different
    /// `NodeRef`, which is how subscriptions detect replacement.
    NodeRef,
    "node"
);

host_handle!(
    /// A registered event listener.
    ListenerId,
    "listener"
);

host_handle!(
    /// A registered box-size observation.
    ObserverId,
    "observer"
);

host_handle!(
    /// A pending single-shot timer.
    TimerId,
    "timer"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_round_trip_raw_values() {
        assert_eq!(NodeRef::from_raw(7).raw(), 7);
        assert_eq!(TimerId::from_raw(u64::MAX).raw(), u64::MAX);
    }

    #[test]
    fn handles_display_with_kind_prefix() {
        assert_eq!(NodeRef::from_raw(3).to_string(), "node#3");
        assert_eq!(ListenerId::from_raw(4).to_string(), "listener#4");
        assert_eq!(ObserverId::from_raw(5).to_string(), "observer#5");
    }

    #[test]
    fn equality_is_identity() {
        assert_eq!(NodeRef::from_raw(1), NodeRef::from_raw(1));
        assert_ne!(NodeRef::from_raw(1), NodeRef::from_raw(2));
    }
}
