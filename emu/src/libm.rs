//! Single precision math functions the interpreter can stand in for, keyed
//! by their C name.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type Unary = fn(f32) -> f32;
pub type Binary = fn(f32, f32) -> f32;

static UNARY: Lazy<HashMap<&'static str, Unary>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Unary> = HashMap::new();
    map.insert("sinf", f32::sin);
    map.insert("cosf", f32::cos);
    map.insert("tanf", f32::tan);
    map.insert("asinf", f32::asin);
    map.insert("acosf", f32::acos);
    map.insert("atanf", f32::atan);
    map.insert("sinhf", f32::sinh);
    map.insert("coshf", f32::cosh);
    map.insert("tanhf", f32::tanh);
    map.insert("asinhf", f32::asinh);
    map.insert("acoshf", f32::acosh);
    map.insert("atanhf", f32::atanh);
    map.insert("expf", f32::exp);
    map.insert("exp2f", f32::exp2);
    map.insert("exp10f", |a| 10.0_f32.powf(a));
    map.insert("expm1f", f32::exp_m1);
    map.insert("logf", f32::ln);
    map.insert("log2f", f32::log2);
    map.insert("log10f", f32::log10);
    map.insert("log1pf", f32::ln_1p);
    map.insert("sqrtf", f32::sqrt);
    map.insert("rsqrtf", |a| a.sqrt().recip());
    map.insert("cbrtf", f32::cbrt);
    map.insert("rcbrtf", |a| a.cbrt().recip());
    map.insert("fabsf", f32::abs);
    map.insert("floorf", f32::floor);
    map.insert("ceilf", f32::ceil);
    map.insert("truncf", f32::trunc);
    map.insert("roundf", f32::round);
    map.insert("rintf", f32::round_ties_even);
    map.insert("nearbyintf", f32::round_ties_even);
    map.insert("sinpif", |a| (a * std::f32::consts::PI).sin());
    map.insert("cospif", |a| (a * std::f32::consts::PI).cos());
    map.insert("saturatef", |a| a.clamp(0.0, 1.0));
    map
});

static BINARY: Lazy<HashMap<&'static str, Binary>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Binary> = HashMap::new();
    map.insert("atan2f", f32::atan2);
    map.insert("powf", f32::powf);
    map.insert("fmodf", |a, b| a % b);
    map.insert("fmaxf", f32::max);
    map.insert("fminf", f32::min);
    map.insert("fdimf", |a, b| (a - b).max(0.0));
    map.insert("hypotf", f32::hypot);
    map.insert("copysignf", f32::copysign);
    map.insert("fdividef", |a, b| a / b);
    map
});

pub fn unary(name: &str) -> Option<Unary> {
    UNARY.get(name).copied()
}

pub fn binary(name: &str) -> Option<Binary> {
    BINARY.get(name).copied()
}
