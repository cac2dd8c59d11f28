use num_bigint::BigUint;
use num_traits::{Float, NumCast, One, PrimInt, Zero};

const KEY_NAMES: &[(u32, &str)] = &[
    (192, "`"),
    (189, "-"),
    (187, "="),
    (91, "meta"),
    (40, "down"),
    (39, "right"),
    (38, "up"),
    (37, "left"),
    (32, "space"),
    (27, "esc"),
    (20, "capslock"),
    (18, "option"),
    (17, "control"),
    (16, "shift"),
    (13, "return"),
    (9, "tab"),
    (8, "delete"),
];

const CLICK_NAMES: [&str; 3] = ["left", "middle", "right"];

pub trait NumberExt: Float {
    /// Remainder that takes the sign of the divisor.
    fn modulo(self, n: Self) -> Self {
        ((self % n) + n) % n
    }

    /// Wraps into the half-open range `[min, max)`.
    fn wrap(self, min: Self, max: Self) -> Self {
        min + (self - min).modulo(max - min)
    }

    /// Exclusive on both ends.
    fn between(self, min: Self, max: Self) -> bool {
        min < self && self < max
    }

    fn clamp_between(self, min: Self, max: Self) -> Self {
        self.min(max).max(min)
    }

    /// `self`-th root of `value`.
    fn root(self, value: Self) -> Self {
        value.powf(Self::one() / self)
    }

    fn factorial(self) -> Self {
        let mut acc = Self::one();
        let mut n = self;
        while n > Self::zero() {
            acc = acc * n;
            n = n - Self::one();
        }
        acc
    }

    fn choose(self, k: Self) -> Self {
        self.factorial() / ((self - k).factorial() * k.factorial())
    }

    fn multi_choose(self, k: Self) -> Self {
        (self + k - Self::one()).choose(k)
    }

    /// Base-16 rendering; fractional digits are emitted for non-integers.
    fn to_hex(self) -> String {
        let Some(value) = self.to_f64() else {
            return "NaN".into();
        };
        if value.is_nan() {
            return "NaN".into();
        }
        if value.is_infinite() {
            return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
        }
        let sign = if value < 0.0 { "-" } else { "" };
        let magnitude = value.abs();
        let mut out = format!("{sign}{:x}", magnitude.trunc() as u128);
        let mut fraction = magnitude.fract();
        if fraction > 0.0 {
            out.push('.');
            for _ in 0..13 {
                if fraction == 0.0 {
                    break;
                }
                fraction *= 16.0;
                let digit = fraction.trunc() as u32;
                out.push(char::from_digit(digit, 16).unwrap_or('0'));
                fraction = fraction.fract();
            }
        }
        out
    }

    /// Mouse button code (1, 2, 3) to its name.
    fn to_click(self) -> Option<&'static str> {
        let code = self.to_i64()?;
        let idx = usize::try_from(code.checked_sub(1)?).ok()?;
        CLICK_NAMES.get(idx).copied()
    }

    /// Key code to key name, falling back to the lower-cased character.
    fn to_key(self) -> String {
        let Some(code) = self.to_u32() else {
            return String::new();
        };
        if let Some((_, name)) = KEY_NAMES.iter().find(|(key, _)| *key == code) {
            return (*name).to_string();
        }
        char::from_u32(code)
            .map(|ch| ch.to_lowercase().collect())
            .unwrap_or_default()
    }
}

impl<T: Float> NumberExt for T {}

pub trait IntegerExt: PrimInt {
    /// `self.pow(exponent) % modulus` without intermediate overflow.
    fn powmod(self, exponent: Self, modulus: Self) -> Option<Self> {
        let modulus = modulus.to_u128().filter(|m| *m > 0)?;
        let mut base = self.to_u128()? % modulus;
        let mut exponent = exponent.to_u128()?;
        let mut result = 1u128 % modulus;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = mul_mod(result, base, modulus);
            }
            exponent >>= 1;
            base = mul_mod(base, base, modulus);
        }
        <Self as NumCast>::from(result)
    }
}

impl<T: PrimInt> IntegerExt for T {}

fn mul_mod(a: u128, b: u128, modulus: u128) -> u128 {
    match a.checked_mul(b) {
        Some(product) => product % modulus,
        None => {
            let mut acc = 0u128;
            let mut a = a % modulus;
            let mut b = b;
            while b > 0 {
                if b & 1 == 1 {
                    acc = (acc + a) % modulus;
                }
                a = (a << 1) % modulus;
                b >>= 1;
            }
            acc
        }
    }
}

pub fn gcd<T: PrimInt>(a: T, b: T) -> T {
    if b.is_zero() { a } else { gcd(b, a % b) }
}

/// n-th Fibonacci number via Binet's formula, rounded.
pub fn fibonacci(n: u32) -> f64 {
    let sqrt5 = 5f64.sqrt();
    let phi = (1.0 + sqrt5) / 2.0;
    let psi = (1.0 - sqrt5) / 2.0;
    ((phi.powi(n as i32) - psi.powi(n as i32)) / sqrt5).round()
}

pub fn factorial_exact(n: u32) -> BigUint {
    (1..=n).fold(BigUint::one(), |acc, k| acc * BigUint::from(k))
}

pub fn choose_exact(n: u32, k: u32) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    let k = k.min(n - k);
    let mut acc = BigUint::one();
    for i in 0..k {
        acc = acc * BigUint::from(n - i) / BigUint::from(i + 1);
    }
    acc
}
