fn main() {
    println!("cargo:rerun-if-env-changed=ORION_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=ORION_WIFI_PASS");

    // Host builds (tests, property checks) have no ESP-IDF toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
