//! Property tests for the credentials profile

use proptest::prelude::*;

use wifi_beacon_ble::{BeaconConfig, WifiCredentials};

fn credential() -> impl Strategy<Value = String> {
    "[ -~]{1,64}"
}

proptest! {
    #[test]
    fn writes_never_change_reads(
        writes in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..16)
    ) {
        let profile = BeaconConfig::default().profile().unwrap();

        for characteristic in &profile.characteristics {
            let before = characteristic.read();
            for data in &writes {
                prop_assert_eq!(&characteristic.write(data), data);
            }
            prop_assert_eq!(characteristic.read(), before);
        }
    }

    #[test]
    fn reads_return_configured_values(
        bssid in credential(),
        ssid in credential(),
        psk in credential(),
    ) {
        let credentials = WifiCredentials { bssid, ssid, psk };
        let config = BeaconConfig::default().with_credentials(credentials.clone());
        let profile = config.profile().unwrap();

        let reads: Vec<Vec<u8>> = profile.characteristics.iter().map(|c| c.read()).collect();
        prop_assert_eq!(
            reads,
            vec![
                credentials.bssid.into_bytes(),
                credentials.ssid.into_bytes(),
                credentials.psk.into_bytes(),
            ]
        );
    }
}
