//! Static descriptions of the indexed corpus.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Committee {
    pub name_en: &'static str,
    pub name_jp: &'static str,
    pub meetings: &'static str,
}

pub const COMMITTEES: [Committee; 8] = [
    Committee {
        name_en: "Basic Electricity & Gas Policy",
        name_jp: "電力・ガス基本政策小委員会",
        meetings: "85th-87th meetings",
    },
    Committee {
        name_en: "Renewable Energy & Networks",
        name_jp: "再生可能エネルギー大量導入・次世代電力ネットワーク小委員会",
        meetings: "72nd-74th meetings",
    },
    Committee {
        name_en: "Next Generation Power System",
        name_jp: "次世代電力系統ワーキンググループ",
        meetings: "1st-2nd sessions",
    },
    Committee {
        name_en: "Distributed Power Systems",
        name_jp: "次世代の分散型電力システムに関する検討会",
        meetings: "12th meeting",
    },
    Committee {
        name_en: "Watt Bit Collaboration",
        name_jp: "ワット・ビット連携官民懇談会",
        meetings: "1st-3rd sessions",
    },
    Committee {
        name_en: "Carbon Management",
        name_jp: "カーボンマネジメント小委員会",
        meetings: "9th meeting",
    },
    Committee {
        name_en: "Simultaneous Markets",
        name_jp: "同時市場の在り方等に関する検討会",
        meetings: "13th-17th meetings",
    },
    Committee {
        name_en: "Adjustment Capacity",
        name_jp: "調整力及び需給バランス評価等に関する委員会",
        meetings: "2025 meetings",
    },
];

/// Suggestions shown to new users, in both supported languages.
pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What external changes are impacting Japan's electricity system?",
    "日本の再生可能エネルギーの現状は？",
    "What are the main challenges in grid modernization?",
    "電力市場の改革について教えてください",
    "How is Japan addressing carbon management?",
];

/// Smoke-test suite covering each committee's topics.
pub const TEST_QUERIES: [&str; 6] = [
    "What external changes are impacting Japan's electricity system?",
    "What are the key challenges in renewable energy integration discussed in the committees?",
    "What is the current status of electricity market reforms in Japan?",
    "How is Japan addressing carbon management in the electricity sector?",
    "What are the main focus areas of the Watt Bit Collaboration Forum?",
    "What distributed power system technologies are being discussed?",
];
