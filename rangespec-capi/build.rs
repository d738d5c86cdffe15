fn main() {
    #[cfg(not(debug_assertions))]
    {
        let major = std::env::var("CARGO_PKG_VERSION_MAJOR").unwrap_or_default();
        let soversion = match major.as_str() {
            "0" => format!(
                "0.{}",
                std::env::var("CARGO_PKG_VERSION_MINOR").unwrap_or_default()
            ),
            _ => major,
        };

        // Set the soname of release builds
        println!(
            "cargo:rustc-cdylib-link-arg=-Wl,-soname,librangespec.so.{}",
            soversion
        );
    }
}
