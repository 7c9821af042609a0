use tracing::trace;

use crate::config::MarkerVocabulary;
use crate::models::{OutlineFragment, OutlineNode, Question, SubQuestion};
use crate::outline::matchers::{LineKind, MarkerMatchers};

/// 重建过程中的列表状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineState {
    /// 没有打开的列表
    Idle,
    /// 一级列表已打开
    InLevel1,
    /// 一级列表和其当前题目下的二级列表都已打开
    InLevel1AndLevel2,
}

impl OutlineState {
    pub fn in_level1(self) -> bool {
        !matches!(self, OutlineState::Idle)
    }

    pub fn in_level2(self) -> bool {
        matches!(self, OutlineState::InLevel1AndLevel2)
    }
}

/// 状态转移产生的动作，由 [`FragmentBuilder`] 依次执行
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    EmitTitle(String),
    EmitParagraph(String),
    OpenLevel1,
    CloseLevel1,
    OpenLevel2,
    CloseLevel2,
    PushQuestion(String),
    PushSubQuestion(String),
    /// 追加到当前最内层打开的条目
    Continue(String),
}

/// 转移表
fn transition(state: OutlineState, kind: LineKind) -> (OutlineState, Vec<Action>) {
    use Action::*;
    use OutlineState::*;

    match (state, kind) {
        (_, LineKind::Skip) => (state, vec![]),
        (_, LineKind::Title(text)) => (state, vec![EmitTitle(text)]),

        (Idle, LineKind::Numbered(text)) => (InLevel1, vec![OpenLevel1, PushQuestion(text)]),
        (InLevel1, LineKind::Numbered(text)) => (InLevel1, vec![PushQuestion(text)]),
        (InLevel1AndLevel2, LineKind::Numbered(text)) => {
            (InLevel1, vec![CloseLevel2, PushQuestion(text)])
        }

        // 没有一级上下文的字母编号只是普通文本
        (Idle, LineKind::Lettered(text)) => (Idle, vec![EmitParagraph(text)]),
        (InLevel1, LineKind::Lettered(text)) => {
            (InLevel1AndLevel2, vec![OpenLevel2, PushSubQuestion(text)])
        }
        (InLevel1AndLevel2, LineKind::Lettered(text)) => {
            (InLevel1AndLevel2, vec![PushSubQuestion(text)])
        }

        (Idle, LineKind::Text(text)) => (Idle, vec![EmitParagraph(text)]),
        (_, LineKind::Text(text)) => (state, vec![Continue(text)]),
    }
}

/// 输入结束时关闭所有仍打开的列表
fn finish(state: OutlineState) -> Vec<Action> {
    match state {
        OutlineState::Idle => vec![],
        OutlineState::InLevel1 => vec![Action::CloseLevel1],
        OutlineState::InLevel1AndLevel2 => vec![Action::CloseLevel2, Action::CloseLevel1],
    }
}

#[derive(Default)]
struct FragmentBuilder {
    nodes: Vec<OutlineNode>,
    level1: Option<Vec<Question>>,
    level2_open: bool,
}

impl FragmentBuilder {
    fn apply(&mut self, action: Action) {
        match action {
            Action::EmitTitle(text) => self.nodes.push(OutlineNode::Title(text)),
            Action::EmitParagraph(text) => self.nodes.push(OutlineNode::Paragraph(text)),
            Action::OpenLevel1 => {
                self.level1.get_or_insert_with(Vec::new);
            }
            Action::CloseLevel1 => {
                self.level2_open = false;
                if let Some(questions) = self.level1.take() {
                    self.nodes.push(OutlineNode::Questions(questions));
                }
            }
            Action::OpenLevel2 => self.level2_open = true,
            Action::CloseLevel2 => self.level2_open = false,
            Action::PushQuestion(text) => {
                self.level1
                    .get_or_insert_with(Vec::new)
                    .push(Question::new(text));
            }
            Action::PushSubQuestion(text) => {
                if let Some(question) = self.current_question() {
                    question.sub_questions.push(SubQuestion::new(text));
                }
            }
            Action::Continue(text) => {
                let level2_open = self.level2_open;
                let Some(question) = self.current_question() else {
                    self.nodes.push(OutlineNode::Paragraph(text));
                    return;
                };
                match question.sub_questions.last_mut() {
                    Some(sub) if level2_open => sub.lines.push(text),
                    _ => question.lines.push(text),
                }
            }
        }
    }

    fn current_question(&mut self) -> Option<&mut Question> {
        self.level1.as_mut().and_then(|qs| qs.last_mut())
    }

    fn build(self) -> OutlineFragment {
        OutlineFragment { nodes: self.nodes }
    }
}

/// 可复用的重建器，持有编译好的匹配器
pub struct OutlineReconstructor {
    matchers: MarkerMatchers,
}

impl OutlineReconstructor {
    pub fn new(vocabulary: &MarkerVocabulary) -> Self {
        Self {
            matchers: MarkerMatchers::new(vocabulary),
        }
    }

    /// 逐行驱动状态机，结束时关闭所有打开的列表
    pub fn reconstruct<S: AsRef<str>>(&self, lines: &[S]) -> OutlineFragment {
        let mut state = OutlineState::Idle;
        let mut builder = FragmentBuilder::default();

        for (i, raw) in lines.iter().enumerate() {
            let line = raw.as_ref().trim();
            let (matcher, kind) = self.matchers.classify(line, state);
            let (next, actions) = transition(state, kind);
            trace!("第 {} 行: {} ({:?} -> {:?})", i, matcher, state, next);
            for action in actions {
                builder.apply(action);
            }
            state = next;
        }

        for action in finish(state) {
            builder.apply(action);
        }
        builder.build()
    }
}

/// 用给定词汇表重建大纲，参见 [`OutlineReconstructor::reconstruct`]
pub fn reconstruct<S: AsRef<str>>(lines: &[S], vocabulary: &MarkerVocabulary) -> OutlineFragment {
    OutlineReconstructor::new(vocabulary).reconstruct(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(lines: &[&str]) -> OutlineFragment {
        reconstruct(lines, &MarkerVocabulary::default())
    }

    #[test]
    fn test_full_exercise() {
        let fragment = rebuild(&[
            "Exercice 1",
            "",
            "Soit $f(x) = x^2$.",
            "1. Calculer $f(2)$.",
            "2. Étudier $f$.",
            "a) Montrer que f est paire.",
            "on pourra utiliser $f(-x)$",
            "b) Conclure.",
            "3. Tracer la courbe.",
            "# commentaire",
        ]);

        assert_eq!(
            fragment.nodes,
            vec![
                OutlineNode::Title("Exercice 1".to_string()),
                OutlineNode::Paragraph("Soit $f(x) = x^2$.".to_string()),
                OutlineNode::Questions(vec![
                    Question::new("Calculer $f(2)$."),
                    Question {
                        lines: vec!["Étudier $f$.".to_string()],
                        sub_questions: vec![
                            SubQuestion {
                                lines: vec![
                                    "Montrer que f est paire.".to_string(),
                                    "on pourra utiliser $f(-x)$".to_string(),
                                ],
                            },
                            SubQuestion::new("Conclure."),
                        ],
                    },
                    Question::new("Tracer la courbe."),
                ]),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(rebuild(&[]).is_empty());
        assert!(rebuild(&["", "   ", "# x"]).is_empty());
    }

    #[test]
    fn test_only_letter_markers_are_paragraphs() {
        let fragment = rebuild(&["a) un", "b) deux"]);
        assert_eq!(
            fragment.nodes,
            vec![
                OutlineNode::Paragraph("a) un".to_string()),
                OutlineNode::Paragraph("b) deux".to_string()),
            ]
        );
    }

    #[test]
    fn test_truncated_input_is_closed() {
        let fragment = rebuild(&["1. Question", "a) début de"]);
        assert_eq!(
            fragment.nodes,
            vec![OutlineNode::Questions(vec![Question {
                lines: vec!["Question".to_string()],
                sub_questions: vec![SubQuestion::new("début de")],
            }])]
        );
    }

    #[test]
    fn test_continuation_before_sub_list_goes_to_question() {
        let fragment = rebuild(&["1. Soit", "la suite", "a) x"]);
        let question = fragment.questions().next().unwrap();
        assert_eq!(question.lines, vec!["Soit", "la suite"]);
        assert_eq!(question.sub_questions.len(), 1);
    }

    #[test]
    fn test_title_inside_list_is_continuation() {
        let fragment = rebuild(&["1. a", "Exercice 2"]);
        let question = fragment.questions().next().unwrap();
        assert_eq!(question.lines, vec!["a", "Exercice 2"]);
    }

    #[test]
    fn test_out_of_order_numbers_keep_input_order() {
        let fragment = rebuild(&["3. c", "1. a", "ii) x", "2. b"]);
        let texts: Vec<&str> = fragment.questions().map(|q| q.text()).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
        assert_eq!(fragment.questions().nth(1).unwrap().sub_questions.len(), 1);
    }

    #[test]
    fn test_transition_table() {
        let (next, actions) = transition(
            OutlineState::InLevel1AndLevel2,
            LineKind::Numbered("x".to_string()),
        );
        assert_eq!(next, OutlineState::InLevel1);
        assert_eq!(
            actions,
            vec![Action::CloseLevel2, Action::PushQuestion("x".to_string())]
        );
        assert_eq!(
            finish(OutlineState::InLevel1AndLevel2),
            vec![Action::CloseLevel2, Action::CloseLevel1]
        );
    }

    #[test]
    fn test_flatten_round_trip() {
        let fragment = rebuild(&[
            "Exercice 3",
            "Intro",
            "1. Premier",
            "suite",
            "(a) x",
            "(b) y",
            "2.",
        ]);
        assert_eq!(rebuild_owned(&fragment.to_lines()), fragment);
    }

    fn rebuild_owned(lines: &[String]) -> OutlineFragment {
        reconstruct(lines, &MarkerVocabulary::default())
    }
}
