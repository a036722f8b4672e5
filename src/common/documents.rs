// src/common/documents.rs
//
// Documentos brasileiros (CPF/CNPJ), CEP e verificação de Luhn para cartões.

/// Remove pontuação: "529.982.247-25" -> "52998224725".
pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn to_digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn is_valid_cpf(value: &str) -> bool {
    let digits = to_digits(value);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

pub fn is_valid_cnpj(value: &str) -> bool {
    let digits = to_digits(value);
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        let rest = sum % 11;
        if rest < 2 { 0 } else { 11 - rest }
    };

    check(&FIRST) == digits[12] && check(&SECOND) == digits[13]
}

/// CPF (11 dígitos) ou CNPJ (14 dígitos).
pub fn is_valid_cpf_or_cnpj(value: &str) -> bool {
    match only_digits(value).len() {
        11 => is_valid_cpf(value),
        14 => is_valid_cnpj(value),
        _ => false,
    }
}

pub fn is_valid_zipcode(value: &str) -> bool {
    let digits = only_digits(value);
    digits.len() == 8 && value.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.')
}

pub fn luhn_valid(number: &str) -> bool {
    let digits = to_digits(number);
    if digits.len() < 12 || digits.len() > 19 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Bandeira a partir do prefixo (IIN), só para exibição.
pub fn card_brand(number: &str) -> &'static str {
    let digits = only_digits(number);
    match digits.as_bytes() {
        [b'4', ..] => "visa",
        [b'5', b'1'..=b'5', ..] | [b'2', b'2'..=b'7', ..] => "master",
        [b'3', b'4' | b'7', ..] => "amex",
        [b'6', b'0' | b'5', ..] => "elo",
        _ => "desconhecida",
    }
}

/// Placa antiga (ABC1234) ou Mercosul (ABC1D23).
pub fn is_valid_plate(value: &str) -> bool {
    let plate: Vec<char> = value
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    plate.len() == 7
        && plate[..3].iter().all(|c| c.is_ascii_uppercase())
        && plate[3].is_ascii_digit()
        && (plate[4].is_ascii_digit() || plate[4].is_ascii_uppercase())
        && plate[5..].iter().all(|c| c.is_ascii_digit())
}

/// "abc-1d23" -> "ABC1D23".
pub fn normalize_plate(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const BRAZILIAN_STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

pub fn is_brazilian_state(value: &str) -> bool {
    BRAZILIAN_STATES.contains(&value.to_ascii_uppercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_check_digits() {
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("52998224724"));
        assert!(!is_valid_cpf("11111111111"));
        assert!(!is_valid_cpf("5299822472"));
    }

    #[test]
    fn cnpj_check_digits() {
        assert!(is_valid_cnpj("11222333000181"));
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11444777000161"));
        assert!(!is_valid_cnpj("11222333000182"));
        assert!(!is_valid_cnpj("00000000000000"));
    }

    #[test]
    fn cpf_or_cnpj_dispatches_on_length() {
        assert!(is_valid_cpf_or_cnpj("52998224725"));
        assert!(is_valid_cpf_or_cnpj("11222333000181"));
        assert!(!is_valid_cpf_or_cnpj("123"));
    }

    #[test]
    fn zipcode_accepts_mask() {
        assert!(is_valid_zipcode("01310-100"));
        assert!(is_valid_zipcode("01310100"));
        assert!(!is_valid_zipcode("0131010"));
        assert!(!is_valid_zipcode("SW1A 1AA"));
    }

    #[test]
    fn luhn() {
        assert!(luhn_valid("4111 1111 1111 1111"));
        assert!(luhn_valid("5555555555554444"));
        assert!(!luhn_valid("4111111111111112"));
        assert!(!luhn_valid("4111"));
    }

    #[test]
    fn brands() {
        assert_eq!(card_brand("4111111111111111"), "visa");
        assert_eq!(card_brand("5555555555554444"), "master");
        assert_eq!(card_brand("378282246310005"), "amex");
    }

    #[test]
    fn plates() {
        assert!(is_valid_plate("ABC-1234"));
        assert!(is_valid_plate("abc1d23"));
        assert!(!is_valid_plate("AB12345"));
        assert_eq!(normalize_plate("abc-1d23"), "ABC1D23");
    }

    #[test]
    fn states() {
        assert!(is_brazilian_state("sp"));
        assert!(!is_brazilian_state("XX"));
    }
}
