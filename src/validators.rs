//! Brazilian document validation: CPF and CNPJ check digits, RG shape.
//! Formatting mirrors what the registration forms send back.

fn digits_of(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Validates a CPF (11 digits, two modulo-11 check digits).
/// Accepts punctuated ("000.000.000-00") or raw input.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits = digits_of(cpf);

    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    let check = |count: usize| -> u32 {
        let sum: u32 = digits[..count]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (count as u32 + 1 - i as u32))
            .sum();
        let remainder = (sum * 10) % 11;
        if remainder >= 10 { 0 } else { remainder }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// Formats CPF digits progressively towards `000.000.000-00`.
pub fn format_cpf(cpf: &str) -> String {
    let d: String = cpf.chars().filter(|c| c.is_ascii_digit()).take(11).collect();

    match d.len() {
        0..=3 => d,
        4..=6 => format!("{}.{}", &d[..3], &d[3..]),
        7..=9 => format!("{}.{}.{}", &d[..3], &d[3..6], &d[6..]),
        _ => format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
    }
}

/// Validates a CNPJ (14 digits, two weighted modulo-11 check digits).
pub fn validate_cnpj(cnpj: &str) -> bool {
    let digits = digits_of(cnpj);

    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    let check = |count: usize| -> u32 {
        let mut pos = count as u32 - 7;
        let mut sum = 0;
        for d in &digits[..count] {
            sum += d * pos;
            pos = if pos <= 2 { 9 } else { pos - 1 };
        }
        if sum % 11 < 2 { 0 } else { 11 - sum % 11 }
    };

    check(12) == digits[12] && check(13) == digits[13]
}

/// Formats CNPJ digits progressively towards `00.000.000/0000-00`.
pub fn format_cnpj(cnpj: &str) -> String {
    let d: String = cnpj.chars().filter(|c| c.is_ascii_digit()).take(14).collect();

    match d.len() {
        0..=2 => d,
        3..=5 => format!("{}.{}", &d[..2], &d[2..]),
        6..=8 => format!("{}.{}.{}", &d[..2], &d[2..5], &d[5..]),
        9..=12 => format!("{}.{}.{}/{}", &d[..2], &d[2..5], &d[5..8], &d[8..]),
        _ => format!("{}.{}.{}/{}-{}", &d[..2], &d[2..5], &d[5..8], &d[8..12], &d[12..]),
    }
}

/// RG has no national check digit; accept 7 to 14 alphanumerics.
pub fn validate_rg(rg: &str) -> bool {
    let len = rg.chars().filter(|c| c.is_ascii_alphanumeric()).count();
    (7..=14).contains(&len)
}
