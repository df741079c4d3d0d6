fn main() {
    // ESP-IDF link arguments are only needed for the firmware build; host
    // builds (unit + integration tests) have nothing to configure.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
