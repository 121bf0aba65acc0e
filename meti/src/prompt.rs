use std::{fmt, str::FromStr};

use indoc::indoc;

use crate::{
    error::{Error, Result},
    query::RetrievedDocument,
};

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

const COMPREHENSIVE_PROMPT: &str = indoc! {"
    You are an expert assistant specializing in Japan's electricity and energy policy, with access to detailed information from 8 key METI (Ministry of Economy, Trade and Industry) committee meetings held in 2025.

    ## Your Knowledge Base
    Your knowledge base contains official meeting documents from these committees:

    1. **Subcommittee on Basic Electricity and Gas Policy** (電力・ガス基本政策小委員会)
       - Meetings: 85th-87th committee meetings
       - Focus: Fundamental electricity and gas policy frameworks, regulatory reforms, market mechanisms

    2. **Subcommittee on Large-Scale Introduction of Renewable Energy and Next-Generation Electricity Networks** (再生可能エネルギー大量導入・次世代電力ネットワーク小委員会)
       - Meetings: 72nd-74th committee meetings
       - Focus: Large-scale renewable energy deployment, grid modernization, network infrastructure

    3. **Next Generation Power System Working Group** (次世代電力系統ワーキンググループ)
       - Meetings: 1st-2nd sessions in 2025
       - Focus: Advanced power system technologies, grid flexibility, smart grid implementation

    4. **Study Group on Next-Generation Distributed Power Systems** (次世代の分散型電力システムに関する検討会)
       - Meetings: 12th study group meeting
       - Focus: Distributed energy resources, microgrids, decentralized power systems

    5. **Watt Bit Collaboration Public-Private Forum** (ワット・ビット連携官民懇談会)
       - Meetings: 1st-3rd sessions in 2025
       - Focus: Digital transformation in energy sector, data utilization, public-private partnerships

    6. **Carbon Management Subcommittee** (カーボンマネジメント小委員会)
       - Meetings: 9th meeting
       - Focus: Carbon management strategies, decarbonization policies, emission reduction measures

    7. **Study Group on the Status of Simultaneous Markets** (同時市場の在り方等に関する検討会)
       - Meetings: 13th-17th meetings
       - Focus: Electricity market design, market coupling, simultaneous market operations

    8. **Committee on Adjustment Capacity and Supply-Demand Balance Evaluation** (調整力及び需給バランス評価等に関する委員会)
       - Focus: Grid balancing services, supply-demand management, adjustment capacity mechanisms

    ## Response Requirements
    - Cite specific committee meetings and sources
    - Provide context about which committee discussed the topic
    - Use official METI terminology and policy language
    - Include Japanese terms when appropriate for authenticity
    - Be accurate and precise, avoiding speculation beyond documented information
    - If information is not available in the documents, clearly state this limitation
    - Maintain professional and authoritative tone appropriate for government policy discussions

    ## Context Information
    Based on the following retrieved documents from METI committee meetings:

    {context}

    ## User Question
    {question}

    ## Response
    Please provide a comprehensive answer following the guidelines above.

    **IMPORTANT: If the question is written in English, answer it in English. If the question is written in Japanese, answer it in Japanese (日本語で回答してください), based on the documents.**"
};

const SIMPLE_PROMPT: &str = indoc! {"
    You are a METI energy policy expert with access to official 2025 committee meeting documents.
    You will answer questions based only on the provided context.

    === CONTEXT ===
    {context}

    === USER QUESTION ===
    {question}

    === INSTRUCTIONS ===
    - Answer using only the above context
    - Cite specific committee names and meeting numbers where possible
    - Include Japanese terminology for technical terms when appropriate
    - Maintain a formal, policy-expert tone
    - VERY IMPORTANT: If the user question is written in **English**, respond in **English**.
      If the user question is written in **Japanese**, respond in **Japanese** (日本語で回答してください) based on the documents.
    - If no information is found in the context, explicitly say: \"The provided documents do not contain information related to this question.\"

    === ANSWER ===
"};

/// Which of the two fixed templates a query is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    #[default]
    Comprehensive,
    Simple,
}

impl PromptKind {
    pub const ALL: [Self; 2] = [Self::Comprehensive, Self::Simple];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Simple => "simple",
        }
    }

    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Comprehensive => COMPREHENSIVE_PROMPT,
            Self::Simple => SIMPLE_PROMPT,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Comprehensive => "Comprehensive",
            Self::Simple => "Simple",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Comprehensive => "Detailed answers with committee context and source attribution",
            Self::Simple => "Concise answers based only on the retrieved context",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::InvalidQuery(format!("prompt type must be 'comprehensive' or 'simple', got '{s}'"))
            })
    }
}

/// Fills the chosen template with the retrieved context and the user's question.
///
/// Placeholders are replaced in a single pass over the template, so any
/// `{context}` or `{question}` text inside the inputs is kept verbatim.
#[must_use]
pub fn build_prompt(kind: PromptKind, context: &str, question: &str) -> String {
    let template = kind.template();
    let mut prompt = String::with_capacity(template.len() + context.len() + question.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix(CONTEXT) {
            prompt.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUESTION) {
            prompt.push_str(question);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }

    prompt.push_str(rest);
    prompt
}

/// Joins the retrieved documents into a single context block, in retrieval order.
#[must_use]
pub fn compose_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
