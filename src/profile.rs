//! Analysis profiles.
//!
//! A profile bundles everything that differs between presentations of the
//! same analysis: the system instruction, the default note sent with a bare
//! attachment, the role set rendered as cards, the render mode and the
//! user-facing messages.

use std::{fmt, str::FromStr};

/// A member of the virtual production team, keyed by its JSON field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub key: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    /// One-line description used by the role listing.
    pub summary: &'static str,
}

/// How a successful result is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One card per populated role
    #[default]
    Cards,
    /// The whole response as one pretty-printed JSON block
    RawJson,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cards" => Ok(RenderMode::Cards),
            "json" | "raw" | "raw-json" => Ok(RenderMode::RawJson),
            other => Err(format!("unknown output mode '{other}'")),
        }
    }
}

/// User-facing banner texts, one per failure class plus UI labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub missing_credential: &'static str,
    pub empty_request: &'static str,
    pub attachment_too_large: &'static str,
    pub malformed_response: &'static str,
    pub empty_response: &'static str,
    pub transport: &'static str,
    pub submitting: &'static str,
    pub results_footer: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileId {
    Pro,
    Compact,
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfileId::Pro => "pro",
            ProfileId::Compact => "compact",
        })
    }
}

impl FromStr for ProfileId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" => Ok(ProfileId::Pro),
            "compact" => Ok(ProfileId::Compact),
            other => Err(format!("unknown profile '{other}' (expected 'pro' or 'compact')")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub name: &'static str,
    pub system_instruction: &'static str,
    pub default_note: &'static str,
    pub roles: &'static [Role],
    pub render_mode: RenderMode,
    pub messages: Messages,
}

impl Profile {
    pub fn get(id: ProfileId) -> &'static Profile {
        match id {
            ProfileId::Pro => &PRO,
            ProfileId::Compact => &COMPACT,
        }
    }

    pub fn role(&self, key: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.key == key)
    }
}

const PRO_INSTRUCTION: &str = r#"
אתה צוות הפקה הוליוודי שלם המנתח את הסרטון/תמונה/טקסט של המשתמש.
עליך לספק את התשובה בפורמט JSON בלבד, כאשר כל מפתח מייצג איש מקצוע אחר בצוות.
התוכן של כל איש מקצוע צריך להיות בעברית, עשיר, מקצועי, ומעוצב (ניתן להשתמש ב-Markdown עבור רשימות והדגשות).

המטרה: להפוך את המשתמש לכוכב.

המבנה הנדרש (JSON):
{
  "director": "ניתוח הבמאי: נוכחות, שפת גוף, כריזמה, קצב הסרטון, והמסר הכללי. מה עבד ומה לא.",
  "casting": "ניתוח המלהק: אמינות המשחק, התאמה לדמות (טייפקאסט), סוג הז'אנר (דרמה/קומדיה/וכו'), והאם היית עובר אודישן.",
  "scriptwriter": "התסריטאי: 3 גרסאות משופרות לטקסט (רגשית, אנרגטית, אותנטית) כולל הוקים חזקים לפתיחה וקריאה לפעולה בסוף.",
  "acting_coach": "מאמן הביצוע: דגשים על אינטונציה, הבעות פנים, עמידה מול מצלמה, ושימוש בידיים.",
  "cinematographer": "צלם ותאורן: הערות על התאורה, זווית הצילום, הרקע (Setting), והקומפוזיציה.",
  "sound_editor": "איש הסאונד והעריכה: הערות על איכות השמע, קצב הדיבור, המלצות למוזיקת רקע או אפקטים, וחיתוכים.",
  "stylist": "הסטייליסטית: הערות על הלבוש, השיער, וההופעה החיצונית ביחס למסר או לדמות.",
  "producer": "המפיק הראשי: סיכום כללי, הערכת סיכויי הצלחה/קבלה באחוזים, ו-3 משימות פרקטיות לפעם הבאה."
}

הטון: יוקרתי, מקצועי, חד, ללא חנופה, בעיניים של תעשיית הקולנוע והתוכן הגבוהה.
"#;

const COMPACT_INSTRUCTION: &str = r#"
You are a complete film production team reviewing the user's video, image or text.
Answer with JSON only. Every key is one professional on the team and every value
is that professional's feedback as rich text (Markdown lists and **bold** are allowed).

Required structure (JSON):
{
  "director": "Presence, body language, charisma, pacing and the overall message. What worked and what did not.",
  "casting": "Believability, fit for the character, genre, and whether this would pass an audition.",
  "scriptwriter": "Three improved versions of the text (emotional, energetic, authentic) with a strong hook and a call to action.",
  "coach": "Delivery: intonation, facial expression, standing in front of the camera, use of hands.",
  "cinematographer": "Lighting, camera angle, background and composition.",
  "sound_editor": "Audio quality, speaking pace, music or effects suggestions, cuts.",
  "stylist": "Wardrobe, hair and overall look relative to the message or character.",
  "producer": "Summary, estimated chance of success as a percentage, and three practical tasks for next time."
}

Tone: premium, professional, sharp, no flattery.
"#;

static PRO_ROLES: [Role; 8] = [
    Role {
        key: "director",
        title: "הבמאי",
        subtitle: "Viral Director",
        summary: "ניתוח נוכחות, שפת גוף, וקצב. שיפור החיבור לצופה והכוח הרגשי של הסרטון.",
    },
    Role {
        key: "casting",
        title: "המלהק",
        subtitle: "Casting Director",
        summary: "ניתוח אודישנים מקצועי: האם המשחק אמין? האם הוא מתאים לדמות?",
    },
    Role {
        key: "scriptwriter",
        title: "התסריטאי",
        subtitle: "Scriptwriter AI",
        summary: "שכתוב הטקסט ל-3 גרסאות: רגשית, אנרגטית ואותנטית, כולל הוקים חזקים.",
    },
    Role {
        key: "acting_coach",
        title: "מאמן הביצוע",
        subtitle: "Acting Coach",
        summary: "שיפור האינטונציה, הבעות הפנים והגשת הטקסט (Delivery).",
    },
    Role {
        key: "cinematographer",
        title: "צלם ותאורן",
        subtitle: "Cinematographer",
        summary: "הנחיות מדויקות לתאורה, זווית צילום, ורקעים שיחמיאו לשחקן.",
    },
    Role {
        key: "sound_editor",
        title: "סאונד ועריכה",
        subtitle: "Sound & Edit",
        summary: "איכות השמע, קצב הדיבור, מוזיקת רקע וחיתוכים.",
    },
    Role {
        key: "stylist",
        title: "סטייליסטית",
        subtitle: "Stylist",
        summary: "לבוש, שיער והופעה חיצונית ביחס למסר או לדמות.",
    },
    Role {
        key: "producer",
        title: "מפיק ראשי",
        subtitle: "Executive Producer",
        summary: "משימות להמשך, הערכת סיכויי קבלה ושיפור של 30% בכל טייק.",
    },
];

static COMPACT_ROLES: [Role; 8] = [
    Role {
        key: "director",
        title: "Director",
        subtitle: "Viral Director",
        summary: "Presence, body language, pacing and emotional pull.",
    },
    Role {
        key: "casting",
        title: "Casting",
        subtitle: "Casting Director",
        summary: "Is the acting believable, and does it fit the character?",
    },
    Role {
        key: "scriptwriter",
        title: "Scriptwriter",
        subtitle: "Scriptwriter AI",
        summary: "Three rewrites of the text with strong hooks.",
    },
    Role {
        key: "coach",
        title: "Coach",
        subtitle: "Performance Coach",
        summary: "Intonation, facial expression and delivery.",
    },
    Role {
        key: "cinematographer",
        title: "Cinematographer",
        subtitle: "Camera & Light",
        summary: "Lighting, angles and backgrounds.",
    },
    Role {
        key: "sound_editor",
        title: "Sound & Edit",
        subtitle: "Post Production",
        summary: "Audio quality, pacing, music and cuts.",
    },
    Role {
        key: "stylist",
        title: "Stylist",
        subtitle: "Wardrobe",
        summary: "Wardrobe, hair and overall look.",
    },
    Role {
        key: "producer",
        title: "Producer",
        subtitle: "Executive Producer",
        summary: "Summary, odds of success and next tasks.",
    },
];

pub static PRO: Profile = Profile {
    id: ProfileId::Pro,
    name: "Viral Video Director Pro",
    system_instruction: PRO_INSTRUCTION,
    default_note: "אנא נתח את הקובץ לפי הפורמט המלא שלך.",
    roles: &PRO_ROLES,
    render_mode: RenderMode::Cards,
    messages: Messages {
        missing_credential: "חסר מפתח API. ודא שהגדרת GEMINI_API_KEY בסביבה או בקובץ .env.",
        empty_request: "אנא העלה וידאו/תמונה או כתוב טקסט כדי להתחיל.",
        attachment_too_large: "קובץ גדול מדי (מקסימום 20MB לגרסת הדמו).",
        malformed_response: "התשובה שהתקבלה אינה בפורמט התקין. נסה שנית.",
        empty_response: "לא התקבלה תשובה. נסה שנית.",
        transport: "שגיאה בעיבוד הבקשה. נסה שנית.",
        submitting: "🎬 הצוות צופה בסרטון...",
        results_footer: "VIRALY DIRECTOR PRO",
    },
};

pub static COMPACT: Profile = Profile {
    id: ProfileId::Compact,
    name: "Viral Video Director",
    system_instruction: COMPACT_INSTRUCTION,
    default_note: "Please analyze the file using your full format.",
    roles: &COMPACT_ROLES,
    render_mode: RenderMode::RawJson,
    messages: Messages {
        missing_credential: "Missing API key. Set GEMINI_API_KEY in the environment or a .env file.",
        empty_request: "Upload a video/image or write some text to get started.",
        attachment_too_large: "File is too large (20MB maximum).",
        malformed_response: "The response was not in the expected format. Please try again.",
        empty_response: "No response was received. Please try again.",
        transport: "The request failed. Please try again.",
        submitting: "The team is watching your video...",
        results_footer: "VIRALY DIRECTOR",
    },
};

/// The capability overview shown by `viral-director capabilities`.
pub const CAPABILITIES: &[(&str, &[&str])] = &[
    (
        "1. ניתוח סרטון מלא (Creator Boost)",
        &["נוכחות, גוף, קול, מסר, רגש."],
    ),
    (
        "2. מלהק מקצועי",
        &[
            "קביעת סוג הסצנה: קומית, דרמטית, רומנטית, מרגשת.",
            "הסבר איך לצלם אותה נכון.",
            "כיוון משחק: עמידה, מבט, טון, קצב.",
            "טיפים ברמת שחקן מקצועי.",
        ],
    ),
    (
        "3. מאמן משחק",
        &[
            "הנחיות הבעה.",
            "תנועות ידיים נכונות.",
            "משחק מול מצלמה.",
            "איך להגיש טקסט.",
        ],
    ),
    (
        "4. ניתוח אודישן",
        &[
            "האם המשחק אמיתי?",
            "האם זה מתאים לדמות?",
            "מה לשפר כדי לקבל את התפקיד?",
        ],
    ),
    (
        "5. תסריטאי",
        &[
            "יצירת 3 גרסאות של טקסט משופר.",
            "פתיחה חזקה.",
            "סיום מרגש/משכנע.",
        ],
    ),
    (
        "6. יועץ הפקה",
        &[
            "תאורה לצילום אודישן.",
            "זוויות צילום מומלצות.",
            "רקעים שמחמיאים לשחקן.",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_sets_differ_only_in_coach() {
        let pro: Vec<_> = PRO.roles.iter().map(|r| r.key).collect();
        let compact: Vec<_> = COMPACT.roles.iter().map(|r| r.key).collect();
        assert!(pro.contains(&"acting_coach"));
        assert!(compact.contains(&"coach"));
        assert_eq!(
            pro.iter().filter(|k| !compact.contains(*k)).collect::<Vec<_>>(),
            vec![&"acting_coach"]
        );
    }

    #[test]
    fn system_instructions_name_every_role() {
        for profile in [&PRO, &COMPACT] {
            for role in profile.roles {
                assert!(
                    profile.system_instruction.contains(&format!("\"{}\"", role.key)),
                    "{} instruction misses {}",
                    profile.id,
                    role.key
                );
            }
        }
    }

    #[test]
    fn parses_profile_and_mode_names() {
        assert_eq!("PRO".parse::<ProfileId>().unwrap(), ProfileId::Pro);
        assert_eq!(" compact ".parse::<ProfileId>().unwrap(), ProfileId::Compact);
        assert!("studio".parse::<ProfileId>().is_err());
        assert_eq!("json".parse::<RenderMode>().unwrap(), RenderMode::RawJson);
        assert_eq!("cards".parse::<RenderMode>().unwrap(), RenderMode::Cards);
    }
}
