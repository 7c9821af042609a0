//! LaTeX 输出
//!
//! 只生成源码，不负责编译。正文内容本身已是 LaTeX（`$...$`、`\[...\]`），原样输出。

use std::fmt::Write as _;

use crate::models::{OutlineFragment, OutlineNode, Question};

/// 文档级选项
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub title: String,
    pub subtitle: Option<String>,
    /// 首页页眉文字，`\\` 会被替换为 `\newline `
    pub header: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            title: "Devoir de Mathématiques".to_string(),
            subtitle: None,
            header: None,
        }
    }
}

/// 待输出的一个练习；`fragment` 为 `None` 表示生成失败，输出时跳过
#[derive(Debug, Clone)]
pub struct RenderedExercise {
    pub key: String,
    pub fragment: Option<OutlineFragment>,
}

/// 把大纲片段渲染为 LaTeX 正文
///
/// 每个 `\begin{enumerate}` 都有对应的 `\end{enumerate}`
pub fn render_fragment(fragment: &OutlineFragment) -> String {
    let mut out = String::new();
    for node in &fragment.nodes {
        match node {
            OutlineNode::Title(text) => {
                let _ = write!(out, "\\textbf{{{}}}\n\n", text);
            }
            OutlineNode::Paragraph(text) => {
                let _ = write!(out, "{}\n\n", text);
            }
            OutlineNode::Questions(questions) => render_questions(&mut out, questions),
        }
    }
    out
}

fn render_questions(out: &mut String, questions: &[Question]) {
    out.push_str("\\begin{enumerate}\n");
    for question in questions {
        push_item(out, &question.lines);
        if !question.sub_questions.is_empty() {
            out.push_str("\\begin{enumerate}\n");
            for sub in &question.sub_questions {
                push_item(out, &sub.lines);
            }
            out.push_str("\\end{enumerate}\n");
        }
    }
    out.push_str("\\end{enumerate}\n");
}

fn push_item(out: &mut String, lines: &[String]) {
    let mut lines = lines.iter();
    let first = lines.next().map(String::as_str).unwrap_or_default();
    let _ = writeln!(out, "\\item {}", first);
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
}

/// 生成完整的独立 LaTeX 文档
pub fn render_document(exercises: &[RenderedExercise], options: &DocumentOptions) -> String {
    let mut doc = preamble(options.header.as_deref());
    doc.push_str(&title_block(&options.title, options.subtitle.as_deref()));

    let rendered: Vec<&OutlineFragment> =
        exercises.iter().filter_map(|e| e.fragment.as_ref()).collect();
    for (i, fragment) in rendered.iter().enumerate() {
        doc.push_str("\\begin{exercice}\n");
        doc.push_str(&render_fragment(fragment));
        doc.push_str("\\end{exercice}\n");
        if i + 1 < rendered.len() {
            doc.push_str("\n\\vspace{1.5cm}\n\n");
        }
    }

    doc.push_str("\n\\end{document}\n");
    doc
}

fn preamble(header: Option<&str>) -> String {
    let mut out = String::from(
        r"\documentclass[11pt,a4paper]{article}

\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage[french]{babel}
\usepackage{amsmath, amssymb, amsthm}
\usepackage{geometry}
\usepackage{graphicx}
\usepackage{fancyhdr}
\usepackage{enumitem}
\usepackage{xcolor}

\geometry{a4paper, top=2.5cm, bottom=2.5cm, left=2cm, right=2cm, headheight=60pt}

\fancypagestyle{firstpage}{
    \fancyhf{}
",
    );

    if let Some(header) = header {
        let header = header.replace("\\\\", "\\newline ");
        out.push_str("    \\fancyhead[C]{");
        let _ = write!(out, "\\begin{{tabular}}{{c}}\\textbf{{{}}}\\end{{tabular}}", header);
        out.push_str("}\n");
    }

    out.push_str(
        r"    \fancyfoot[C]{\thepage}
    \renewcommand{\headrulewidth}{0.4pt}
    \renewcommand{\footrulewidth}{0.4pt}
}

\fancypagestyle{otherpage}{
    \fancyhf{}
    \fancyfoot[C]{\thepage}
    \renewcommand{\headrulewidth}{0pt}
    \renewcommand{\footrulewidth}{0.4pt}
}

\pagestyle{otherpage}

\newtheoremstyle{exercice}
  {10pt}{10pt}{\normalfont}{}{\bfseries}{.}{.5em}{}
\theoremstyle{exercice}
\newtheorem{exercice}{Exercice}

\setlist[enumerate,1]{label=\textbf{\arabic*.}, leftmargin=*, itemsep=8pt, parsep=4pt, topsep=8pt}
\setlist[enumerate,2]{label=\textbf{\alph*)}, leftmargin=*, itemsep=6pt, parsep=3pt}

\begin{document}

\thispagestyle{firstpage}

",
    );
    out
}

fn title_block(title: &str, subtitle: Option<&str>) -> String {
    let mut out = String::from("\\begin{center}\n");
    let _ = writeln!(out, "    {{\\LARGE\\bfseries {}}}", title);
    if let Some(subtitle) = subtitle {
        out.push_str("\n    \\vspace{0.3cm}\n\n");
        let _ = writeln!(out, "    {{\\large {}}}", subtitle);
    }
    out.push_str("\n    \\vspace{0.5cm}\n\n    \\hrule\n    \\vspace{1cm}\n\\end{center}\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerVocabulary;
    use crate::outline::reconstruct;

    fn fragment(lines: &[&str]) -> OutlineFragment {
        reconstruct(lines, &MarkerVocabulary::default())
    }

    #[test]
    fn test_render_fragment_nested_lists() {
        let latex = render_fragment(&fragment(&[
            "Exercice 1",
            "Soit $f$.",
            "1. Calculer.",
            "a) x",
            "suite de x",
            "2. Conclure.",
        ]));
        assert_eq!(
            latex,
            "\\textbf{Exercice 1}\n\n\
             Soit $f$.\n\n\
             \\begin{enumerate}\n\
             \\item Calculer.\n\
             \\begin{enumerate}\n\
             \\item x\n\
             suite de x\n\
             \\end{enumerate}\n\
             \\item Conclure.\n\
             \\end{enumerate}\n"
        );
    }

    #[test]
    fn test_render_is_balanced_for_truncated_input() {
        let latex = render_fragment(&fragment(&["1. a", "(i) b"]));
        assert_eq!(
            latex.matches("\\begin{enumerate}").count(),
            latex.matches("\\end{enumerate}").count()
        );
    }

    #[test]
    fn test_render_document_skips_failed_exercises() {
        let exercises = vec![
            RenderedExercise {
                key: "exercice 1".to_string(),
                fragment: Some(fragment(&["1. a"])),
            },
            RenderedExercise {
                key: "exercice 2".to_string(),
                fragment: None,
            },
            RenderedExercise {
                key: "exercice 3".to_string(),
                fragment: Some(fragment(&["1. b"])),
            },
        ];
        let options = DocumentOptions {
            title: "Devoir".to_string(),
            subtitle: Some("Durée: 2h".to_string()),
            header: Some("Lycée\\\\Terminale".to_string()),
        };
        let doc = render_document(&exercises, &options);

        assert!(doc.starts_with("\\documentclass"));
        assert!(doc.trim_end().ends_with("\\end{document}"));
        assert_eq!(doc.matches("\\begin{exercice}").count(), 2);
        assert_eq!(doc.matches("\\vspace{1.5cm}").count(), 1);
        assert!(doc.contains("{\\large Durée: 2h}"));
        assert!(doc.contains("Lycée\\newline Terminale"));
    }
}
