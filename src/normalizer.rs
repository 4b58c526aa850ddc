// 🔤 Normalizer - Case, accent and whitespace folding for free-text labels
// Spreadsheet text is typed by hand: "Cimento  CP-II", "cimento cp-ii" and
// "CIMENTO CP-II" must all compare equal.

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Fold a label into its matching form.
///
/// Trims, collapses whitespace runs into a single space, lower-cases and
/// folds the accents that show up in the sheets (ç, á/à/ã/â, é/ê, í, ó/ô/õ, ú).
/// Any other character passes through untouched, so the result is
/// reproducible without a Unicode normalization table.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    for word in text.split_whitespace() {
        if !folded.is_empty() {
            folded.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            folded.push(fold_accent(c));
        }
    }

    folded
}

fn fold_accent(c: char) -> char {
    match c {
        'ç' => 'c',
        'á' | 'à' | 'ã' | 'â' => 'a',
        'é' | 'ê' => 'e',
        'í' => 'i',
        'ó' | 'ô' | 'õ' => 'o',
        'ú' => 'u',
        other => other,
    }
}

/// Capitalize each whitespace-separated word, keeping accents.
///
/// "despesa  aleatória" → "Despesa Aleatória". Whitespace runs collapse to a
/// single space so labels that differ only in spacing stay the same item.
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());

    for word in text.split_whitespace() {
        if !titled.is_empty() {
            titled.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            titled.extend(first.to_uppercase());
            titled.extend(chars.flat_map(char::to_lowercase));
        }
    }

    titled
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_lowercases() {
        assert_eq!(normalize("Cimento  CP-II"), "cimento cp-ii");
        assert_eq!(normalize("  Areia \t Média \n"), "areia media");
    }

    #[test]
    fn test_folds_accents() {
        assert_eq!(normalize("Tijolo Cerâmico"), "tijolo ceramico");
        assert_eq!(normalize("Çà Ã Â É Ê Í Ó Ô Õ Ú"), "ca a a e e i o o o u");
        assert_eq!(normalize("Vergalhão"), "vergalhao");
    }

    #[test]
    fn test_leaves_other_characters_alone() {
        // ü and ñ are not part of the folding table
        assert_eq!(normalize("Güell Ñ"), "güell ñ");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Cimento  CP-II",
            "Tijolo Cerâmico",
            "  AÇO   CA-50 ",
            "Despesa aleatória",
            "",
            "ÁÀÃÂ",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("despesa aleatória"), "Despesa Aleatória");
        assert_eq!(title_case("  MÃO DE OBRA "), "Mão De Obra");
        assert_eq!(title_case("Frete  caçamba"), "Frete Caçamba");
        assert_eq!(title_case("frete \t caçamba\n"), "Frete Caçamba");
        assert_eq!(title_case(""), "");
    }
}
