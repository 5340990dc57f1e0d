use crate::models::{Intent, Locale};

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn detect_locale(explicit: Option<Locale>, text: &str) -> Locale {
    if let Some(locale) = explicit {
        if locale != Locale::Unknown {
            return locale;
        }
    }

    let mut arabic_count = 0usize;
    let mut latin_count = 0usize;
    let mut french_marks = 0usize;

    for ch in text.chars() {
        let code = ch as u32;
        if (0x0600..=0x06FF).contains(&code) || (0x0750..=0x077F).contains(&code) {
            arabic_count += 1;
        } else if ch.is_ascii_alphabetic() {
            latin_count += 1;
        } else if "éèêàâçùûôîïë".contains(ch.to_lowercase().next().unwrap_or(ch)) {
            latin_count += 1;
            french_marks += 1;
        }
    }

    if arabic_count > 0 && arabic_count >= latin_count {
        return Locale::Ar;
    }
    if latin_count == 0 {
        return if arabic_count > 0 { Locale::Ar } else { Locale::Unknown };
    }

    let lower = text.to_lowercase();
    let french_words = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| {
            matches!(
                *word,
                "le" | "la" | "les" | "un" | "une" | "des" | "je" | "pour" | "avec" | "nuit"
                    | "chambre" | "réserver" | "prix"
            )
        })
        .count();

    if french_marks > 0 || french_words >= 2 {
        Locale::Fr
    } else {
        Locale::En
    }
}

pub fn classify_intent_rules(text: &str) -> Intent {
    let lower = text.to_lowercase();

    if contains_any(
        &lower,
        &[
            "شكوى",
            "مشكلة",
            "سيء",
            "complaint",
            "problem",
            "refund",
            "plainte",
            "problème",
        ],
    ) {
        return Intent::Complaint;
    }

    if contains_any(
        &lower,
        &[
            "احجز",
            "حجز",
            "التوفر",
            "book",
            "reserve",
            "availability",
            "réserver",
            "réservation",
        ],
    ) {
        return Intent::Booking;
    }

    if contains_any(
        &lower,
        &["تقييم", "مراجعة", "review", "rating", "avis", "note"],
    ) {
        return Intent::Review;
    }

    if contains_any(
        &lower,
        &[
            "ابحث",
            "فندق في",
            "فنادق",
            "search",
            "find",
            "hotels in",
            "chercher",
            "trouver",
        ],
    ) {
        return Intent::Search;
    }

    if contains_any(
        &lower,
        &[
            "كيف",
            "الدفع",
            "الإلغاء",
            "مساعدة",
            "how do",
            "help",
            "payment",
            "cancel",
            "aide",
            "annuler",
        ],
    ) {
        return Intent::Help;
    }

    if contains_any(
        &lower,
        &[
            "معلومات",
            "المرافق",
            "سياسات",
            "info",
            "amenities",
            "policy",
            "check-in",
            "équipements",
        ],
    ) {
        return Intent::Info;
    }

    Intent::General
}

/// Quick-reply suggestions shown under an assistant answer.
pub fn suggestions_for(intent: Intent) -> Vec<String> {
    let items: &[&str] = match intent {
        Intent::Search => &[
            "ابحث عن فندق في الجزائر",
            "ابحث عن فنادق فاخرة",
            "فندقي قرب المركز",
        ],
        Intent::Booking => &["احجز غرفة", "تحقق من التوفر", "أسعار الأسبوع القادم"],
        Intent::Info => &["معلومات حول الفندق", "قائمة المرافق", "سياسات الفندق"],
        Intent::Help => &["كيفية الحجز", "طرق الدفع", "سياسة الإلغاء"],
        Intent::Complaint => &["تواصل مع الدعم", "قدم شكوى", "المشاكل التقنية"],
        Intent::Review => &["قيم الفندق", "اطلب مراجعة", "اكتب تقييم"],
        Intent::Error => &["جرب البحث مرة أخرى", "تحدث مع فريق الدعم"],
        Intent::General => &[
            "ما هي فنادقك المفضلة؟",
            "ساعدني في الاختيار",
            "نصائح للسفر",
        ],
    };
    items.iter().map(|item| item.to_string()).collect()
}

/// Words longer than two characters, used when keyword extraction is unavailable.
pub fn fallback_keywords(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .map(ToString::to_string)
        .collect()
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
