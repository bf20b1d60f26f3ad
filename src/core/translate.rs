// Ping keyword translation.
//
// One table, applied in a single pass. Longer keys win at each position, so
// "Flycatchers" is never read as "Flycatcher" + "s", and replacement output is
// never translated again.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

const KEYWORDS: &[(&str, &str)] = &[
    ("Flycatchers", "轻拦队"),
    ("Flycatcher", "Flycatcher(飞燕级)"),
    ("Kirin/Scalpel", "Kirin/Scalpel(麒麟级/手术刀级)"),
    ("Boosters", "Boosters(加成跳驱)"),
    ("Harpy", "Harpy(女妖级)"),
    ("Torp Bombers", "Torp Bombers(隐轰队)"),
    ("Purifier", "Purifier(净化级)"),
    ("Hound", "Hound(猎犬级)"),
    ("Astero", "Astero(阿斯特罗级)"),
    ("Else", "Else(其他)"),
    ("Ferox Navy Issue", "Ferox Navy Issue(猛鲑级海军型)"),
    ("Basilisk", "Basilisk(皇冠蜥级)"),
    ("Support", "Support(电子战船/抓人船)"),
    ("Logi", "Logi(后勤)"),
    ("Kikis", "Kikis(奇奇莫拉级)"),
    ("Slasher", "Slasher(伐木者级)"),
    ("Hyena", "Hyena(土狼级)"),
    ("Keres", "Keres(克勒斯级)"),
    ("Moa", "Moa(巨鸟级)"),
    ("Osprey", "Osprey(鱼鹰级)"),
    ("RNI", "RNI(乌鸦级海军型)"),
    ("Rokh", "Rokh(鹏鲲级)"),
    ("Scythe", "Scythe(镰刀级)"),
    ("ONI", "ONI(鱼鹰级海军型)"),
    ("Manticore", "Manticore(蝎尾怪级)"),
    ("Nemesis", "Nemesis(纳美西斯级)"),
    ("ceptors", "ceptors(截击)"),
    ("Cyclone Fleet Issues", "Cyclone Fleet Issues(飓风级舰队型)"),
    ("CFI", "CFI(飓风级舰队型)"),
    ("Huginn", "Huginn(休津级)"),
    ("Lach", "Lach(拉克希斯级)"),
    ("Svipul", "Svipul(斯威普级)"),
    ("Deacon", "Deacon(执事级)"),
    ("ENI", "ENI(送葬者级海军型)"),
    ("Sleipnir", "Sleipnir(斯雷普尼级)"),
    ("Drake", "Drake(幼龙级)"),
];

lazy_static! {
    static ref TRANSLATIONS: HashMap<&'static str, &'static str> =
        KEYWORDS.iter().copied().collect();
    static ref KEYWORD_REGEX: Regex = {
        let mut keys: Vec<&str> = TRANSLATIONS.keys().copied().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let pattern = keys
            .iter()
            .map(|key| regex::escape(key))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&pattern).expect("keyword pattern is built from escaped literals")
    };
}

/// Replace every known keyword in `text`.
pub fn translate(text: &str) -> String {
    KEYWORD_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            let key = &caps[0];
            TRANSLATIONS.get(key).copied().unwrap_or(key).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_key_wins() {
        assert_eq!(translate("Flycatchers"), "轻拦队");
        assert_eq!(translate("Flycatcher"), "Flycatcher(飞燕级)");
    }

    #[test]
    fn test_output_is_not_retranslated() {
        // "Flycatcher(飞燕级)" contains "Flycatcher" again; a chained
        // replace would expand it twice.
        let once = translate("Bring a Flycatcher and a Hound");
        assert_eq!(once, "Bring a Flycatcher(飞燕级) and a Hound(猎犬级)");
    }

    #[test]
    fn test_unknown_text_is_unchanged() {
        assert_eq!(translate("Form up in 1DQ1-A"), "Form up in 1DQ1-A");
        assert_eq!(translate(""), "");
    }

    #[test]
    fn test_multiword_keys() {
        assert_eq!(
            translate("Doctrine: Ferox Navy Issue"),
            "Doctrine: Ferox Navy Issue(猛鲑级海军型)"
        );
    }
}
