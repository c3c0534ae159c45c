//! Built-in dialect drivers.
//!
//! Each module exposes its registry name as `NAME` and a `driver()`
//! constructor. [`DriverRegistry::builtin`](super::DriverRegistry::builtin)
//! registers them most specific first.

pub mod arista_eos;
pub mod cisco_ios;
pub mod cisco_iosxr;
pub mod cisco_nxos;
pub mod generic;
pub mod huawei_vrp;
pub mod juniper_junos;
pub mod linux;
pub mod nokia_sros;
pub mod one_os;

#[cfg(test)]
pub(crate) fn at_tail(set: &crate::channel::PatternSet, data: &[u8]) -> bool {
    set.match_tail(data, &crate::channel::TailAnchor::default())
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crate::error::DriverError;

    #[test]
    fn test_every_builtin_builds_and_validates() {
        type Build = fn() -> Result<Driver, DriverError>;
        let builders: [(&str, Build); 10] = [
            (generic::NAME, generic::driver),
            (cisco_iosxr::NAME, cisco_iosxr::driver),
            (cisco_nxos::NAME, cisco_nxos::driver),
            (cisco_ios::NAME, cisco_ios::driver),
            (arista_eos::NAME, arista_eos::driver),
            (juniper_junos::NAME, juniper_junos::driver),
            (nokia_sros::NAME, nokia_sros::driver),
            (huawei_vrp::NAME, huawei_vrp::driver),
            (one_os::NAME, one_os::driver),
            (linux::NAME, linux::driver),
        ];
        for (name, build) in builders {
            let driver = build().unwrap();
            assert_eq!(driver.name(), name);
            assert!(driver.validate().is_ok(), "{name} failed validation");
        }
    }
}
