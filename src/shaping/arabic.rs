//! Contextual shaping of Arabic-script letters
//!
//! PDF text is drawn glyph by glyph without an OpenType shaping engine, so
//! letters must be replaced by their positional presentation forms
//! (isolated, final, initial, medial) before they reach the page.

/// How a character connects to its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Connects on both sides
    Dual,
    /// Connects only to the preceding letter
    Right,
    /// Skipped when looking for neighbours (harakat)
    Transparent,
    /// Forces a connection without a shape of its own (tatweel, ZWJ)
    Causing,
    /// Breaks the connection
    None,
}

/// Positional form of a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Isolated,
    Final,
    Initial,
    Medial,
}

const HAMZA: char = '\u{0621}';
const ZWNJ: char = '\u{200C}';
const ZWJ: char = '\u{200D}';
const TATWEEL: char = '\u{0640}';
const LAM: char = '\u{0644}';
const RIAL_SIGN: char = '\u{FDFC}';
const RIAL_WORD: &str = "ریال";

/// Presentation forms: (letter, isolated, final, initial, medial).
/// Right-joining letters have no initial or medial forms.
const FORMS: &[(char, char, char, Option<char>, Option<char>)] = &[
    ('\u{0621}', '\u{FE80}', '\u{FE80}', None, None),
    ('\u{0622}', '\u{FE81}', '\u{FE82}', None, None),
    ('\u{0623}', '\u{FE83}', '\u{FE84}', None, None),
    ('\u{0624}', '\u{FE85}', '\u{FE86}', None, None),
    ('\u{0625}', '\u{FE87}', '\u{FE88}', None, None),
    ('\u{0626}', '\u{FE89}', '\u{FE8A}', Some('\u{FE8B}'), Some('\u{FE8C}')),
    ('\u{0627}', '\u{FE8D}', '\u{FE8E}', None, None),
    ('\u{0628}', '\u{FE8F}', '\u{FE90}', Some('\u{FE91}'), Some('\u{FE92}')),
    ('\u{0629}', '\u{FE93}', '\u{FE94}', None, None),
    ('\u{062A}', '\u{FE95}', '\u{FE96}', Some('\u{FE97}'), Some('\u{FE98}')),
    ('\u{062B}', '\u{FE99}', '\u{FE9A}', Some('\u{FE9B}'), Some('\u{FE9C}')),
    ('\u{062C}', '\u{FE9D}', '\u{FE9E}', Some('\u{FE9F}'), Some('\u{FEA0}')),
    ('\u{062D}', '\u{FEA1}', '\u{FEA2}', Some('\u{FEA3}'), Some('\u{FEA4}')),
    ('\u{062E}', '\u{FEA5}', '\u{FEA6}', Some('\u{FEA7}'), Some('\u{FEA8}')),
    ('\u{062F}', '\u{FEA9}', '\u{FEAA}', None, None),
    ('\u{0630}', '\u{FEAB}', '\u{FEAC}', None, None),
    ('\u{0631}', '\u{FEAD}', '\u{FEAE}', None, None),
    ('\u{0632}', '\u{FEAF}', '\u{FEB0}', None, None),
    ('\u{0633}', '\u{FEB1}', '\u{FEB2}', Some('\u{FEB3}'), Some('\u{FEB4}')),
    ('\u{0634}', '\u{FEB5}', '\u{FEB6}', Some('\u{FEB7}'), Some('\u{FEB8}')),
    ('\u{0635}', '\u{FEB9}', '\u{FEBA}', Some('\u{FEBB}'), Some('\u{FEBC}')),
    ('\u{0636}', '\u{FEBD}', '\u{FEBE}', Some('\u{FEBF}'), Some('\u{FEC0}')),
    ('\u{0637}', '\u{FEC1}', '\u{FEC2}', Some('\u{FEC3}'), Some('\u{FEC4}')),
    ('\u{0638}', '\u{FEC5}', '\u{FEC6}', Some('\u{FEC7}'), Some('\u{FEC8}')),
    ('\u{0639}', '\u{FEC9}', '\u{FECA}', Some('\u{FECB}'), Some('\u{FECC}')),
    ('\u{063A}', '\u{FECD}', '\u{FECE}', Some('\u{FECF}'), Some('\u{FED0}')),
    ('\u{0641}', '\u{FED1}', '\u{FED2}', Some('\u{FED3}'), Some('\u{FED4}')),
    ('\u{0642}', '\u{FED5}', '\u{FED6}', Some('\u{FED7}'), Some('\u{FED8}')),
    ('\u{0643}', '\u{FED9}', '\u{FEDA}', Some('\u{FEDB}'), Some('\u{FEDC}')),
    ('\u{0644}', '\u{FEDD}', '\u{FEDE}', Some('\u{FEDF}'), Some('\u{FEE0}')),
    ('\u{0645}', '\u{FEE1}', '\u{FEE2}', Some('\u{FEE3}'), Some('\u{FEE4}')),
    ('\u{0646}', '\u{FEE5}', '\u{FEE6}', Some('\u{FEE7}'), Some('\u{FEE8}')),
    ('\u{0647}', '\u{FEE9}', '\u{FEEA}', Some('\u{FEEB}'), Some('\u{FEEC}')),
    ('\u{0648}', '\u{FEED}', '\u{FEEE}', None, None),
    ('\u{0649}', '\u{FEEF}', '\u{FEF0}', Some('\u{FBE8}'), Some('\u{FBE9}')),
    ('\u{064A}', '\u{FEF1}', '\u{FEF2}', Some('\u{FEF3}'), Some('\u{FEF4}')),
    // Persian letters (Presentation Forms-A)
    ('\u{067E}', '\u{FB56}', '\u{FB57}', Some('\u{FB58}'), Some('\u{FB59}')),
    ('\u{0686}', '\u{FB7A}', '\u{FB7B}', Some('\u{FB7C}'), Some('\u{FB7D}')),
    ('\u{0698}', '\u{FB8A}', '\u{FB8B}', None, None),
    ('\u{06A9}', '\u{FB8E}', '\u{FB8F}', Some('\u{FB90}'), Some('\u{FB91}')),
    ('\u{06AF}', '\u{FB92}', '\u{FB93}', Some('\u{FB94}'), Some('\u{FB95}')),
    ('\u{06C0}', '\u{FBA4}', '\u{FBA5}', None, None),
    ('\u{06CC}', '\u{FBFC}', '\u{FBFD}', Some('\u{FBFE}'), Some('\u{FBFF}')),
];

/// Lam-alef ligatures: (alef variant, isolated, final)
const LAM_ALEF: &[(char, char, char)] = &[
    ('\u{0622}', '\u{FEF5}', '\u{FEF6}'),
    ('\u{0623}', '\u{FEF7}', '\u{FEF8}'),
    ('\u{0625}', '\u{FEF9}', '\u{FEFA}'),
    ('\u{0627}', '\u{FEFB}', '\u{FEFC}'),
];

fn forms_of(c: char) -> Option<&'static (char, char, char, Option<char>, Option<char>)> {
    FORMS.iter().find(|entry| entry.0 == c)
}

/// Harakat and other combining marks of the Arabic block
pub fn is_haraka(c: char) -> bool {
    matches!(
        c,
        '\u{0610}'..='\u{061A}' | '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}'
    )
}

/// Shaped unit: a plain character or a lam-alef ligature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Char(char),
    LamAlef { isolated: char, final_form: char },
}

impl Unit {
    fn joining(&self) -> Joining {
        match *self {
            Unit::LamAlef { .. } => Joining::Right,
            Unit::Char(c) if is_haraka(c) => Joining::Transparent,
            Unit::Char(c) if c == TATWEEL || c == ZWJ => Joining::Causing,
            // Hamza has a final form in the table but never joins
            Unit::Char(HAMZA) => Joining::None,
            Unit::Char(c) => match forms_of(c) {
                Some((_, _, _, Some(_), _)) => Joining::Dual,
                Some(_) => Joining::Right,
                // Arabic letters without presentation forms still join as dual
                None if matches!(c, '\u{0620}'..='\u{064A}' | '\u{066E}'..='\u{06D3}') => {
                    Joining::Dual
                }
                None => Joining::None,
            },
        }
    }

    fn render(&self, form: Form) -> Option<char> {
        match *self {
            Unit::LamAlef { isolated, final_form } => Some(match form {
                Form::Final | Form::Medial => final_form,
                Form::Isolated | Form::Initial => isolated,
            }),
            Unit::Char(c) if c == ZWNJ || c == ZWJ => None,
            Unit::Char(c) => Some(match forms_of(c) {
                Some(&(_, isolated, final_form, initial, medial)) => match form {
                    Form::Isolated => isolated,
                    Form::Final => final_form,
                    Form::Initial => initial.unwrap_or(isolated),
                    Form::Medial => medial.unwrap_or(final_form),
                },
                None => c,
            }),
        }
    }
}

/// Reshaper for Arabic and Persian text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArabicReshaper {
    /// Remove harakat from the output
    pub delete_harakat: bool,
    /// Combine lam and alef into ligatures
    pub support_ligatures: bool,
    /// Replace the word ریال with the rial sign
    pub rial_sign: bool,
}

impl Default for ArabicReshaper {
    fn default() -> Self {
        Self {
            delete_harakat: false,
            support_ligatures: true,
            rial_sign: true,
        }
    }
}

impl ArabicReshaper {
    /// Create a reshaper with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace letters with their contextual presentation forms (logical order is kept)
    pub fn reshape(&self, text: &str) -> String {
        let text = if self.rial_sign {
            replace_rial_word(text)
        } else {
            text.to_string()
        };

        let units = self.build_units(&text);
        let joinings: Vec<Joining> = units.iter().map(Unit::joining).collect();

        let mut out = String::with_capacity(text.len());
        for (idx, unit) in units.iter().enumerate() {
            let joining = joinings[idx];

            if joining == Joining::Transparent {
                if !self.delete_harakat {
                    if let Unit::Char(c) = unit {
                        out.push(*c);
                    }
                }
                continue;
            }

            let prev = neighbour(&joinings, idx, Direction::Before);
            let next = neighbour(&joinings, idx, Direction::After);

            let joins_prev = matches!(joining, Joining::Dual | Joining::Right | Joining::Causing)
                && matches!(prev, Some(Joining::Dual | Joining::Causing));
            let joins_next = matches!(joining, Joining::Dual | Joining::Causing)
                && matches!(next, Some(Joining::Dual | Joining::Right | Joining::Causing));

            let form = match (joins_prev, joins_next) {
                (true, true) => Form::Medial,
                (true, false) => Form::Final,
                (false, true) => Form::Initial,
                (false, false) => Form::Isolated,
            };

            if let Some(c) = unit.render(form) {
                out.push(c);
            }
        }

        out
    }

    fn build_units(&self, text: &str) -> Vec<Unit> {
        let chars: Vec<char> = text.chars().collect();
        let mut units = Vec::with_capacity(chars.len());
        let mut idx = 0;

        while idx < chars.len() {
            let c = chars[idx];
            if c == LAM && self.support_ligatures {
                // Harakat between lam and alef do not block the ligature
                let mut j = idx + 1;
                while j < chars.len() && is_haraka(chars[j]) {
                    j += 1;
                }
                if let Some(&(_, isolated, final_form)) =
                    chars.get(j).and_then(|a| LAM_ALEF.iter().find(|entry| entry.0 == *a))
                {
                    units.push(Unit::LamAlef { isolated, final_form });
                    units.extend(chars[idx + 1..j].iter().map(|c| Unit::Char(*c)));
                    idx = j + 1;
                    continue;
                }
            }
            units.push(Unit::Char(c));
            idx += 1;
        }

        units
    }
}

enum Direction {
    Before,
    After,
}

/// Joining type of the nearest non-transparent unit
fn neighbour(joinings: &[Joining], idx: usize, direction: Direction) -> Option<Joining> {
    match direction {
        Direction::Before => joinings[..idx]
            .iter()
            .rev()
            .find(|j| **j != Joining::Transparent)
            .copied(),
        Direction::After => joinings[idx + 1..]
            .iter()
            .find(|j| **j != Joining::Transparent)
            .copied(),
    }
}

/// Replace the standalone word ریال with the rial sign
fn replace_rial_word(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(RIAL_WORD) {
        let before = rest[..pos].chars().next_back().or_else(|| out.chars().next_back());
        let after = rest[pos + RIAL_WORD.len()..].chars().next();
        let standalone = !before.is_some_and(is_word_letter) && !after.is_some_and(is_word_letter);

        out.push_str(&rest[..pos]);
        if standalone {
            out.push(RIAL_SIGN);
        } else {
            out.push_str(RIAL_WORD);
        }
        rest = &rest[pos + RIAL_WORD.len()..];
    }

    out.push_str(rest);
    out
}

fn is_word_letter(c: char) -> bool {
    c.is_alphanumeric() && !is_haraka(c)
}
