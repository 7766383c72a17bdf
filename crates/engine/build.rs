// crates/engine/build.rs
fn main() {
    let f = |n| std::env::var(format!("CARGO_FEATURE_{}", n)).is_ok();

    if f("IMDS_V1_FALLBACK") && !f("IMDS") {
        panic!("feature 'imds_v1_fallback' requires 'imds'");
    }
}
