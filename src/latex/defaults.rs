//! Built-in signature tables and the babel language table.

use std::sync::LazyLock;

use super::signature::{Action, CommandSignature, EnvironmentSignature};
use crate::dummy::DummyGenerator;

/// Shorthand for the command table below.
const IGNORE: Action = Action::Ignore;
/// Shorthand for the command table below.
const DUMMY: Action = Action::Dummy(DummyGenerator::SINGULAR);
/// Shorthand for the command table below.
const PLURAL: Action = Action::Dummy(DummyGenerator::PLURAL);

/// Babel language names and language tags mapped to language tags.
///
/// `it` and `sl` are left out: `\textit` and `\textsl` would otherwise be read
/// as language switches.
pub const BABEL_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "ar"),
    ("ast", "ast-ES"),
    ("ast-ES", "ast-ES"),
    ("be", "be-BY"),
    ("be-BY", "be-BY"),
    ("br", "br-FR"),
    ("br-FR", "br-FR"),
    ("ca", "ca-ES"),
    ("ca-ES", "ca-ES"),
    ("ca-ES-valencia", "ca-ES-valencia"),
    ("da", "da-DK"),
    ("da-DK", "da-DK"),
    ("de", "de"),
    ("de-AT", "de-AT"),
    ("de-CH", "de-CH"),
    ("de-DE", "de-DE"),
    ("de-DE-x-simple-language", "de-DE-x-simple-language"),
    ("el", "el-GR"),
    ("el-GR", "el-GR"),
    ("en", "en"),
    ("en-AU", "en-AU"),
    ("en-CA", "en-CA"),
    ("en-GB", "en-GB"),
    ("en-NZ", "en-NZ"),
    ("en-US", "en-US"),
    ("en-ZA", "en-ZA"),
    ("eo", "eo"),
    ("es", "es"),
    ("fa", "fa"),
    ("fr", "fr"),
    ("ga", "ga-IE"),
    ("ga-IE", "ga-IE"),
    ("gl", "gl-ES"),
    ("gl-ES", "gl-ES"),
    ("ja", "ja-JP"),
    ("ja-JP", "ja-JP"),
    ("km", "km-KH"),
    ("km-KH", "km-KH"),
    ("nl", "nl"),
    ("pl", "pl-PL"),
    ("pl-PL", "pl-PL"),
    ("pt", "pt"),
    ("pt-AO", "pt-AO"),
    ("pt-BR", "pt-BR"),
    ("pt-MZ", "pt-MZ"),
    ("pt-PT", "pt-PT"),
    ("ro", "ro-RO"),
    ("ro-RO", "ro-RO"),
    ("ru", "ru-RU"),
    ("ru-RU", "ru-RU"),
    ("sk", "sk-SK"),
    ("sk-SK", "sk-SK"),
    ("sl-SI", "sl-SI"),
    ("sv", "sv"),
    ("ta", "ta-IN"),
    ("ta-IN", "ta-IN"),
    ("tl", "tl-PH"),
    ("tl-PH", "tl-PH"),
    ("uk", "uk-UA"),
    ("uk-UA", "uk-UA"),
    ("zh", "zh-CN"),
    ("zh-CN", "zh-CN"),
    ("arabic", "ar"),
    ("asturian", "ast-ES"),
    ("belarusian", "be-BY"),
    ("brazil", "pt-BR"),
    ("brazilian", "pt-BR"),
    ("catalan", "ca-ES"),
    ("danish", "da-DK"),
    ("german", "de-DE"),
    ("ngerman", "de-DE"),
    ("greek", "el-GR"),
    ("british", "en-GB"),
    ("UKenglish", "en-GB"),
    ("american", "en-US"),
    ("english", "en-US"),
    ("USenglish", "en-US"),
    ("esperanto", "eo"),
    ("estonian", "es"),
    ("farsi", "fa"),
    ("french", "fr"),
    ("irish", "ga-IE"),
    ("galician", "gl-ES"),
    ("italian", "it"),
    ("japanese", "ja-JP"),
    ("khmer", "km-KH"),
    ("dutch", "nl"),
    ("polish", "pl-PL"),
    ("portuges", "pt-PT"),
    ("portuguese", "pt-PT"),
    ("romanian", "ro-RO"),
    ("russian", "ru-RU"),
    ("slovak", "sk-SK"),
    ("slovene", "sl-SI"),
    ("swedish", "sv"),
    ("tamil", "ta-IN"),
    ("ukrainian", "uk-UA"),
    ("chinese", "zh-CN"),
];

/// Environments whose body is math.
pub const MATH_ENVIRONMENTS: &[&str] = &[
    "align",
    "align*",
    "alignat",
    "alignat*",
    "displaymath",
    "eqnarray",
    "eqnarray*",
    "equation",
    "equation*",
    "flalign",
    "flalign*",
    "formula",
    "gather",
    "gather*",
    "math",
    "multline",
    "multline*",
];

/// Environments ignored out of the box, besides the babel language names.
const IGNORED_ENVIRONMENTS: &[&str] = &["lstlisting", "otherlanguage", "otherlanguage*", "tikzpicture", "verbatim"];

/// Built-in command prototypes in declaration order.
const COMMANDS: &[(&str, Action)] = &[
    ("\\ac{}", DUMMY),
    ("\\Ac{}", DUMMY),
    ("\\ac[]{}", DUMMY),
    ("\\Ac[]{}", DUMMY),
    ("\\ac*{}", DUMMY),
    ("\\Ac*{}", DUMMY),
    ("\\ac*[]{}", DUMMY),
    ("\\Ac*[]{}", DUMMY),
    ("\\aca{}", DUMMY),
    ("\\Aca{}", DUMMY),
    ("\\aca[]{}", DUMMY),
    ("\\Aca[]{}", DUMMY),
    ("\\aca*{}", DUMMY),
    ("\\Aca*{}", DUMMY),
    ("\\aca*[]{}", DUMMY),
    ("\\Aca*[]{}", DUMMY),
    ("\\acap{}", DUMMY),
    ("\\Acap{}", DUMMY),
    ("\\acap[]{}", DUMMY),
    ("\\Acap[]{}", DUMMY),
    ("\\acap*{}", DUMMY),
    ("\\Acap*{}", DUMMY),
    ("\\acap*[]{}", DUMMY),
    ("\\Acap*[]{}", DUMMY),
    ("\\acf{}", DUMMY),
    ("\\Acf{}", DUMMY),
    ("\\acf[]{}", DUMMY),
    ("\\Acf[]{}", DUMMY),
    ("\\acf*{}", DUMMY),
    ("\\Acf*{}", DUMMY),
    ("\\acf*[]{}", DUMMY),
    ("\\Acf*[]{}", DUMMY),
    ("\\acfp{}", DUMMY),
    ("\\Acfp{}", DUMMY),
    ("\\acfp[]{}", DUMMY),
    ("\\Acfp[]{}", DUMMY),
    ("\\acfp*{}", DUMMY),
    ("\\Acfp*{}", DUMMY),
    ("\\acfp*[]{}", DUMMY),
    ("\\Acfp*[]{}", DUMMY),
    ("\\acl{}", DUMMY),
    ("\\Acl{}", DUMMY),
    ("\\acl[]{}", DUMMY),
    ("\\Acl[]{}", DUMMY),
    ("\\acl*{}", DUMMY),
    ("\\Acl*{}", DUMMY),
    ("\\acl*[]{}", DUMMY),
    ("\\Acl*[]{}", DUMMY),
    ("\\aclp{}", DUMMY),
    ("\\Aclp{}", DUMMY),
    ("\\aclp[]{}", DUMMY),
    ("\\Aclp[]{}", DUMMY),
    ("\\aclp*{}", DUMMY),
    ("\\Aclp*{}", DUMMY),
    ("\\aclp*[]{}", DUMMY),
    ("\\Aclp*[]{}", DUMMY),
    ("\\acp{}", DUMMY),
    ("\\Acp{}", DUMMY),
    ("\\acp[]{}", DUMMY),
    ("\\Acp[]{}", DUMMY),
    ("\\acp*{}", DUMMY),
    ("\\Acp*{}", DUMMY),
    ("\\acp*[]{}", DUMMY),
    ("\\Acp*[]{}", DUMMY),
    ("\\acreset{}", IGNORE),
    ("\\acresetall", IGNORE),
    ("\\acs{}", DUMMY),
    ("\\Acs{}", DUMMY),
    ("\\acs[]{}", DUMMY),
    ("\\Acs[]{}", DUMMY),
    ("\\acs*{}", DUMMY),
    ("\\Acs*{}", DUMMY),
    ("\\acs*[]{}", DUMMY),
    ("\\Acs*[]{}", DUMMY),
    ("\\acsetup{}", IGNORE),
    ("\\acsp{}", DUMMY),
    ("\\Acsp{}", DUMMY),
    ("\\acsp[]{}", DUMMY),
    ("\\Acsp[]{}", DUMMY),
    ("\\acsp*{}", DUMMY),
    ("\\Acsp*{}", DUMMY),
    ("\\acsp*[]{}", DUMMY),
    ("\\Acsp*[]{}", DUMMY),
    ("\\acuse{}", IGNORE),
    ("\\acuseall", IGNORE),
    ("\\addbibresource{}", IGNORE),
    ("\\addcontentsline{}{}{}", IGNORE),
    ("\\addtocontents{}", IGNORE),
    ("\\addtocounter{}{}", IGNORE),
    ("\\addtokomafont{}{}", IGNORE),
    ("\\@addtoreset{}{}", IGNORE),
    ("\\addtotheorempostheadhook{}", IGNORE),
    ("\\addxcontentsline{}{}{}", IGNORE),
    ("\\algdef{}[]{}{}", IGNORE),
    ("\\algnewcommand{}{}", IGNORE),
    ("\\algrenewcommand{}{}", IGNORE),
    ("\\arabic{}", DUMMY),
    ("\\AtBeginEnvironment{}{}", IGNORE),
    ("\\AtEndEnvironment{}{}", IGNORE),
    ("\\autocite{}", DUMMY),
    ("\\autocite[]{}", DUMMY),
    ("\\autocite[][]{}", DUMMY),
    ("\\Autocite{}", DUMMY),
    ("\\Autocite[]{}", DUMMY),
    ("\\Autocite[][]{}", DUMMY),
    ("\\autocite*{}", DUMMY),
    ("\\autocite*[]{}", DUMMY),
    ("\\autocite*[][]{}", DUMMY),
    ("\\Autocite*{}", DUMMY),
    ("\\Autocite*[]{}", DUMMY),
    ("\\Autocite*[][]{}", DUMMY),
    ("\\autocites{}", PLURAL),
    ("\\autocites{}{}", PLURAL),
    ("\\autocites{}{}{}", PLURAL),
    ("\\autocites{}{}{}{}", PLURAL),
    ("\\autocites{}{}{}{}{}", PLURAL),
    ("\\autocites()()[][]{}", PLURAL),
    ("\\autocites()()[][]{}[][]{}", PLURAL),
    ("\\autocites()()[][]{}[][]{}[][]{}", PLURAL),
    ("\\autocites()()[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\autocites()()[][]{}[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\Autocites{}", PLURAL),
    ("\\Autocites{}{}", PLURAL),
    ("\\Autocites{}{}{}", PLURAL),
    ("\\Autocites{}{}{}{}", PLURAL),
    ("\\Autocites{}{}{}{}{}", PLURAL),
    ("\\Autocites()()[][]{}", PLURAL),
    ("\\Autocites()()[][]{}[][]{}", PLURAL),
    ("\\Autocites()()[][]{}[][]{}[][]{}", PLURAL),
    ("\\Autocites()()[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\Autocites()()[][]{}[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\automark{}", IGNORE),
    ("\\automark[]{}", IGNORE),
    ("\\automark*{}", IGNORE),
    ("\\automark*[]{}", IGNORE),
    ("\\autopageref{}", DUMMY),
    ("\\autopageref*{}", DUMMY),
    ("\\autoref{}", DUMMY),
    ("\\autoref*{}", DUMMY),
    ("\\babeltags{}", IGNORE),
    ("\\bibitem{}", IGNORE),
    ("\\bibliography{}", IGNORE),
    ("\\bibliographystyle{}", IGNORE),
    ("\\captionof{}", IGNORE),
    ("\\captionsetup{}", IGNORE),
    ("\\captionsetup[]{}", IGNORE),
    ("\\cite{}", DUMMY),
    ("\\cite[]{}", DUMMY),
    ("\\cite[][]{}", DUMMY),
    ("\\Cite{}", DUMMY),
    ("\\Cite[]{}", DUMMY),
    ("\\Cite[][]{}", DUMMY),
    ("\\cite*{}", DUMMY),
    ("\\cite*[]{}", DUMMY),
    ("\\cite*[][]{}", DUMMY),
    ("\\citealp{}", DUMMY),
    ("\\citealp[]{}", DUMMY),
    ("\\citealp*{}", DUMMY),
    ("\\citealp*[]{}", DUMMY),
    ("\\citealt{}", DUMMY),
    ("\\citealt[]{}", DUMMY),
    ("\\citealt*{}", DUMMY),
    ("\\citealt*[]{}", DUMMY),
    ("\\citeauthor{}", DUMMY),
    ("\\citeauthor[]{}", DUMMY),
    ("\\citeauthor[][]{}", DUMMY),
    ("\\Citeauthor{}", DUMMY),
    ("\\Citeauthor[]{}", DUMMY),
    ("\\Citeauthor[][]{}", DUMMY),
    ("\\citeauthor*{}", DUMMY),
    ("\\citeauthor*[]{}", DUMMY),
    ("\\citeauthor*[][]{}", DUMMY),
    ("\\Citeauthor*{}", DUMMY),
    ("\\Citeauthor*[]{}", DUMMY),
    ("\\Citeauthor*[][]{}", DUMMY),
    ("\\citedate{}", DUMMY),
    ("\\citedate[]{}", DUMMY),
    ("\\citedate[][]{}", DUMMY),
    ("\\citedate*{}", DUMMY),
    ("\\citedate*[]{}", DUMMY),
    ("\\citedate*[][]{}", DUMMY),
    ("\\citep{}", DUMMY),
    ("\\citep[]{}", DUMMY),
    ("\\citep*{}", DUMMY),
    ("\\citep*[]{}", DUMMY),
    ("\\cites{}", PLURAL),
    ("\\cites{}{}", PLURAL),
    ("\\cites{}{}{}", PLURAL),
    ("\\cites{}{}{}{}", PLURAL),
    ("\\cites{}{}{}{}{}", PLURAL),
    ("\\cites()()[][]{}", PLURAL),
    ("\\cites()()[][]{}[][]{}", PLURAL),
    ("\\cites()()[][]{}[][]{}[][]{}", PLURAL),
    ("\\cites()()[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\cites()()[][]{}[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\Cites{}", PLURAL),
    ("\\Cites{}{}", PLURAL),
    ("\\Cites{}{}{}", PLURAL),
    ("\\Cites{}{}{}{}", PLURAL),
    ("\\Cites{}{}{}{}{}", PLURAL),
    ("\\Cites()()[][]{}", PLURAL),
    ("\\Cites()()[][]{}[][]{}", PLURAL),
    ("\\Cites()()[][]{}[][]{}[][]{}", PLURAL),
    ("\\Cites()()[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\Cites()()[][]{}[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\citet{}", DUMMY),
    ("\\citet[]{}", DUMMY),
    ("\\citet*{}", DUMMY),
    ("\\citet*[]{}", DUMMY),
    ("\\citetitle{}", DUMMY),
    ("\\citetitle[]{}", DUMMY),
    ("\\citetitle[][]{}", DUMMY),
    ("\\citetitle*{}", DUMMY),
    ("\\citetitle*[]{}", DUMMY),
    ("\\citetitle*[][]{}", DUMMY),
    ("\\citeurl{}", DUMMY),
    ("\\citeurl[]{}", DUMMY),
    ("\\citeurl[][]{}", DUMMY),
    ("\\citeyear{}", DUMMY),
    ("\\citeyear[]{}", DUMMY),
    ("\\citeyear[][]{}", DUMMY),
    ("\\citeyear*{}", DUMMY),
    ("\\citeyear*[]{}", DUMMY),
    ("\\citeyear*[][]{}", DUMMY),
    ("\\clearfield{}", IGNORE),
    ("\\color{}", IGNORE),
    ("\\color[]{}", IGNORE),
    ("\\colorbox{}", IGNORE),
    ("\\colorlet{}{}", IGNORE),
    ("\\cref{}", DUMMY),
    ("\\Cref{}", DUMMY),
    ("\\crefname{}{}{}", IGNORE),
    ("\\Crefname{}{}{}", IGNORE),
    ("\\DeclareAcronym{}{}", IGNORE),
    ("\\DeclareCaptionFormat{}{}", IGNORE),
    ("\\DeclareCaptionLabelFormat{}{}", IGNORE),
    ("\\DeclareCiteCommand{}{}{}{}{}", IGNORE),
    ("\\DeclareCiteCommand{}[]{}{}{}{}", IGNORE),
    ("\\DeclareFieldFormat{}{}", IGNORE),
    ("\\DeclareFieldFormat[]{}{}", IGNORE),
    ("\\DeclareFieldFormat*{}{}", IGNORE),
    ("\\DeclareGraphicsExtensions{}", IGNORE),
    ("\\DeclareMathAlphabet{}{}{}{}{}", IGNORE),
    ("\\DeclareMathOperator{}{}", IGNORE),
    ("\\DeclareMathOperator*{}{}", IGNORE),
    ("\\DeclareNameAlias{}{}", IGNORE),
    ("\\DeclareNewTOC{}", IGNORE),
    ("\\DeclareNewTOC[]{}", IGNORE),
    ("\\DeclareSIUnit{}{}", IGNORE),
    ("\\DeclareSIUnit[]{}{}", IGNORE),
    ("\\declaretheorem{}", IGNORE),
    ("\\declaretheorem[]{}", IGNORE),
    ("\\declaretheoremstyle{}", IGNORE),
    ("\\declaretheoremstyle[]{}", IGNORE),
    ("\\DeclareTOCStyleEntry{}", IGNORE),
    ("\\DeclareTOCStyleEntry[]{}{}", IGNORE),
    ("\\defbibcheck{}{}", IGNORE),
    ("\\defbibenvironment{}{}{}{}", IGNORE),
    ("\\defbibfilter{}{}", IGNORE),
    ("\\defbibheading{}{}", IGNORE),
    ("\\defbibheading{}[]{}", IGNORE),
    ("\\defbibnote{}{}", IGNORE),
    ("\\definecolor{}{}{}", IGNORE),
    ("\\definespotcolor{}{}{}", IGNORE),
    ("\\directlua{}", IGNORE),
    ("\\DisableLigatures{}", IGNORE),
    ("\\documentclass{}", IGNORE),
    ("\\documentclass[]{}", IGNORE),
    ("\\email{}", DUMMY),
    ("\\enlargethispage{}", IGNORE),
    ("\\eqref{}", DUMMY),
    ("\\etocsetlevel{}{}", IGNORE),
    ("\\etocsetnexttocdepth{}", IGNORE),
    ("\\etocsettocstyle{}{}", IGNORE),
    ("\\fcolorbox{}", IGNORE),
    ("\\floatname{}{}", IGNORE),
    ("\\floatstyle{}", IGNORE),
    ("\\footcite{}", DUMMY),
    ("\\footcite[]{}", DUMMY),
    ("\\footcite[][]{}", DUMMY),
    ("\\footcitetext{}", DUMMY),
    ("\\footcitetext[]{}", DUMMY),
    ("\\footcitetext[][]{}", DUMMY),
    ("\\footnote{}", IGNORE),
    ("\\footnote[]{}", IGNORE),
    ("\\foreignlanguage{}{}", DUMMY),
    ("\\foreignlanguage[]{}{}", DUMMY),
    ("\\GenericWarning{}{}", IGNORE),
    ("\\geometry{}", IGNORE),
    ("\\glsaddstoragekey{}{}{}", IGNORE),
    ("\\graphicspath{}", IGNORE),
    ("\\href{}{}", DUMMY),
    ("\\hyperref[]", IGNORE),
    ("\\hypersetup{}", IGNORE),
    ("\\iac{}", DUMMY),
    ("\\Iac{}", DUMMY),
    ("\\iac[]{}", DUMMY),
    ("\\Iac[]{}", DUMMY),
    ("\\iac*{}", DUMMY),
    ("\\Iac*{}", DUMMY),
    ("\\iac*[]{}", DUMMY),
    ("\\Iac*[]{}", DUMMY),
    ("\\iaca{}", DUMMY),
    ("\\Iaca{}", DUMMY),
    ("\\iaca[]{}", DUMMY),
    ("\\Iaca[]{}", DUMMY),
    ("\\iaca*{}", DUMMY),
    ("\\Iaca*{}", DUMMY),
    ("\\iaca*[]{}", DUMMY),
    ("\\Iaca*[]{}", DUMMY),
    ("\\iacf{}", DUMMY),
    ("\\Iacf{}", DUMMY),
    ("\\iacf[]{}", DUMMY),
    ("\\Iacf[]{}", DUMMY),
    ("\\iacf*{}", DUMMY),
    ("\\Iacf*{}", DUMMY),
    ("\\iacf*[]{}", DUMMY),
    ("\\Iacf*[]{}", DUMMY),
    ("\\iacl{}", DUMMY),
    ("\\Iacl{}", DUMMY),
    ("\\iacl[]{}", DUMMY),
    ("\\Iacl[]{}", DUMMY),
    ("\\iacl*{}", DUMMY),
    ("\\Iacl*{}", DUMMY),
    ("\\iacl*[]{}", DUMMY),
    ("\\Iacl*[]{}", DUMMY),
    ("\\iacs{}", DUMMY),
    ("\\Iacs{}", DUMMY),
    ("\\iacs[]{}", DUMMY),
    ("\\Iacs[]{}", DUMMY),
    ("\\iacs*{}", DUMMY),
    ("\\Iacs*{}", DUMMY),
    ("\\iacs*[]{}", DUMMY),
    ("\\Iacs*[]{}", DUMMY),
    ("\\ifcurrentfield{}", IGNORE),
    ("\\ifentrytype{}", IGNORE),
    ("\\@ifpackageloaded{}", IGNORE),
    ("\\iftoggle{}", IGNORE),
    ("\\include{}", IGNORE),
    ("\\includegraphics{}", IGNORE),
    ("\\includegraphics[]{}", IGNORE),
    ("\\includepdf{}", IGNORE),
    ("\\includepdf[]{}", IGNORE),
    ("\\input{}", IGNORE),
    ("\\KOMAoptions{}", IGNORE),
    ("\\KOMAScript", DUMMY),
    ("\\label{}", IGNORE),
    ("\\LaTeX", DUMMY),
    ("\\lettrine{}{}", DUMMY),
    ("\\lettrine[]{}{}", DUMMY),
    ("\\linespread{}", IGNORE),
    ("\\luadirect{}", IGNORE),
    ("\\luaexec{}", IGNORE),
    ("\\mdfdefinestyle{}{}", IGNORE),
    ("\\multicolumn{}{}", IGNORE),
    ("\\multirow{}{}", IGNORE),
    ("\\newboolean{}", IGNORE),
    ("\\newcolumntype{}{}", IGNORE),
    ("\\newcommand{}{}", IGNORE),
    ("\\newcommand{}[]{}", IGNORE),
    ("\\newcommand{}[][]{}", IGNORE),
    ("\\newcommand*{}{}", IGNORE),
    ("\\newcommand*{}[]{}", IGNORE),
    ("\\newcommand*{}[][]{}", IGNORE),
    ("\\newcounter{}", IGNORE),
    ("\\newenvironment{}{}{}", IGNORE),
    ("\\newenvironment{}[]{}{}", IGNORE),
    ("\\newenvironment*{}{}{}", IGNORE),
    ("\\newenvironment*{}[]{}{}", IGNORE),
    ("\\newfloat{}{}{}", IGNORE),
    ("\\newfloat{}{}{}[]", IGNORE),
    ("\\newgeometry{}", IGNORE),
    ("\\newglossaryentry{}{}", IGNORE),
    ("\\newglossarystyle{}{}", IGNORE),
    ("\\newrefcontext[]", IGNORE),
    ("\\newtheorem{}{}", IGNORE),
    ("\\newtheorem{}{}[]", IGNORE),
    ("\\newtheorem{}[]{}", IGNORE),
    ("\\newtheorem{}[]{}[]", IGNORE),
    ("\\newtheorem*{}{}", IGNORE),
    ("\\newtoggle{}", IGNORE),
    ("\\nolinkurl{}", DUMMY),
    ("\\PackageWarning{}{}", IGNORE),
    ("\\pagecolor{}", IGNORE),
    ("\\pagenumbering{}", IGNORE),
    ("\\pageref{}", DUMMY),
    ("\\pageref*{}", DUMMY),
    ("\\pagestyle{}", IGNORE),
    ("\\parencite{}", DUMMY),
    ("\\parencite[]{}", DUMMY),
    ("\\parencite[][]{}", DUMMY),
    ("\\parencite*{}", DUMMY),
    ("\\parencite*[]{}", DUMMY),
    ("\\parencite*[][]{}", DUMMY),
    ("\\Parencite{}", DUMMY),
    ("\\Parencite[]{}", DUMMY),
    ("\\Parencite[][]{}", DUMMY),
    ("\\pdfbookmark{}{}", IGNORE),
    ("\\pdfbookmark[]{}{}", IGNORE),
    ("\\pgfdeclaredecoration{}{}{}", IGNORE),
    ("\\pgfmathsetseed{}", IGNORE),
    ("\\printacronyms", IGNORE),
    ("\\printacronyms[]", IGNORE),
    ("\\printbibliography", IGNORE),
    ("\\printbibliography[]", IGNORE),
    ("\\printglossary", IGNORE),
    ("\\printglossary[]", IGNORE),
    ("\\providecommand{}{}", IGNORE),
    ("\\providecommand{}[]{}", IGNORE),
    ("\\providecommand*{}{}", IGNORE),
    ("\\providecommand*{}[]{}", IGNORE),
    ("\\raisebox{}", IGNORE),
    ("\\RedeclareSectionCommand{}", IGNORE),
    ("\\RedeclareSectionCommand[]{}", IGNORE),
    ("\\RedeclareSectionCommands{}", IGNORE),
    ("\\RedeclareSectionCommands[]{}", IGNORE),
    ("\\ref{}", DUMMY),
    ("\\ref*{}", DUMMY),
    ("\\renewbibmacro{}{}", IGNORE),
    ("\\renewbibmacro*{}{}", IGNORE),
    ("\\renewcommand{}{}", IGNORE),
    ("\\renewcommand{}[]{}", IGNORE),
    ("\\renewcommand{}[][]{}", IGNORE),
    ("\\renewcommand*{}{}", IGNORE),
    ("\\renewcommand*{}[]{}", IGNORE),
    ("\\renewcommand*{}[][]{}", IGNORE),
    ("\\renewenvironment{}{}{}", IGNORE),
    ("\\renewenvironment{}[]{}{}", IGNORE),
    ("\\renewenvironment*{}{}{}", IGNORE),
    ("\\renewenvironment*{}[]{}{}", IGNORE),
    ("\\renewlist{}{}{}", IGNORE),
    ("\\RequirePackage{}", IGNORE),
    ("\\scalebox{}", IGNORE),
    ("\\selectlanguage{}", IGNORE),
    ("\\setboolean{}", IGNORE),
    ("\\setcopyright{}", IGNORE),
    ("\\setcounter{}{}", IGNORE),
    ("\\setenumerate{}", IGNORE),
    ("\\setglossarystyle{}", IGNORE),
    ("\\setitemize{}", IGNORE),
    ("\\setkomafont{}{}", IGNORE),
    ("\\setkomavar{}{}", IGNORE),
    ("\\setkomavar{}[]{}", IGNORE),
    ("\\setkomavar*{}{}", IGNORE),
    ("\\setkomavar*{}[]{}", IGNORE),
    ("\\setlength{}{}", IGNORE),
    ("\\setlist{}", IGNORE),
    ("\\setlist[]{}", IGNORE),
    ("\\SetMathAlphabet{}{}{}{}{}{}", IGNORE),
    ("\\setparsizes{}{}{}", IGNORE),
    ("\\@setplength{}{}", IGNORE),
    ("\\setstretch{}", IGNORE),
    ("\\setuptoc{}{}", IGNORE),
    ("\\sisetup{}", IGNORE),
    ("\\smartcite{}", DUMMY),
    ("\\smartcite[]{}", DUMMY),
    ("\\smartcite[][]{}", DUMMY),
    ("\\Smartcite{}", DUMMY),
    ("\\Smartcite[]{}", DUMMY),
    ("\\Smartcite[][]{}", DUMMY),
    ("\\stepcounter{}", IGNORE),
    ("\\supercite{}", DUMMY),
    ("\\SweaveInput{}", IGNORE),
    ("\\SweaveOpts{}", IGNORE),
    ("\\SweaveSyntax{}", IGNORE),
    ("\\TeX", DUMMY),
    ("\\textcite{}", DUMMY),
    ("\\textcite[]{}", DUMMY),
    ("\\textcite[][]{}", DUMMY),
    ("\\Textcite{}", DUMMY),
    ("\\Textcite[]{}", DUMMY),
    ("\\Textcite[][]{}", DUMMY),
    ("\\textcites{}", PLURAL),
    ("\\textcites{}{}", PLURAL),
    ("\\textcites{}{}{}", PLURAL),
    ("\\textcites{}{}{}{}", PLURAL),
    ("\\textcites{}{}{}{}{}", PLURAL),
    ("\\textcites()()[][]{}", PLURAL),
    ("\\textcites()()[][]{}[][]{}", PLURAL),
    ("\\textcites()()[][]{}[][]{}[][]{}", PLURAL),
    ("\\textcites()()[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\textcites()()[][]{}[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\Textcites{}", PLURAL),
    ("\\Textcites{}{}", PLURAL),
    ("\\Textcites{}{}{}", PLURAL),
    ("\\Textcites{}{}{}{}", PLURAL),
    ("\\Textcites{}{}{}{}{}", PLURAL),
    ("\\Textcites()()[][]{}", PLURAL),
    ("\\Textcites()()[][]{}[][]{}", PLURAL),
    ("\\Textcites()()[][]{}[][]{}[][]{}", PLURAL),
    ("\\Textcites()()[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\Textcites()()[][]{}[][]{}[][]{}[][]{}[][]{}", PLURAL),
    ("\\textcolor{}", IGNORE),
    ("\\textcolor[]{}", IGNORE),
    ("\\textproc{}", DUMMY),
    ("\\theoremstyle{}", IGNORE),
    ("\\thispagestyle{}", IGNORE),
    ("\\tikz{}", IGNORE),
    ("\\tikzset{}", IGNORE),
    ("\\todo{}", IGNORE),
    ("\\todo[]{}", IGNORE),
    ("\\togglefalse{}", IGNORE),
    ("\\toggletrue{}", IGNORE),
    ("\\unsettoc{}{}", IGNORE),
    ("\\url{}", DUMMY),
    ("\\usebibmacro{}", IGNORE),
    ("\\usekomafont{}", IGNORE),
    ("\\usepackage{}", IGNORE),
    ("\\usepackage[]{}", IGNORE),
    ("\\usetikzlibrary{}", IGNORE),
    ("\\value{}", IGNORE),
    ("\\vspace{}", IGNORE),
    ("\\vspace*{}", IGNORE),
    ("\\WarningFilter{}{}", IGNORE),
];

/// Language tag for a babel language name or tag.
pub fn babel_language(name: &str) -> Option<&'static str> {
    return BABEL_LANGUAGES
        .iter()
        .find(|(babel, _)| return *babel == name)
        .map(|(_, tag)| return *tag);
}

/// The letters-only form used in `\text<tag>` commands and environment names.
pub fn babel_tag(name: &str) -> String {
    return name.chars().filter(char::is_ascii_alphabetic).collect();
}

/// Built-in command signatures, followed by a placeholder `\text<tag>{}` for
/// every babel language.
pub fn command_signatures() -> &'static [CommandSignature] {
    static SIGNATURES: LazyLock<Vec<CommandSignature>> = LazyLock::new(|| {
        let mut signatures: Vec<CommandSignature> = COMMANDS
            .iter()
            .map(|&(prototype, action)| return CommandSignature::new(prototype, action))
            .collect();
        for (name, _) in BABEL_LANGUAGES {
            let prototype = format!("\\text{}{{}}", babel_tag(name));
            signatures.push(CommandSignature::new(&prototype, DUMMY));
        }
        return signatures;
    });
    return &SIGNATURES;
}

/// Built-in ignored environments, including every babel language name and
/// its letters-only form.
pub fn environment_signatures() -> &'static [EnvironmentSignature] {
    static SIGNATURES: LazyLock<Vec<EnvironmentSignature>> = LazyLock::new(|| {
        let mut signatures: Vec<EnvironmentSignature> = IGNORED_ENVIRONMENTS
            .iter()
            .map(|name| return EnvironmentSignature::new(name, IGNORE))
            .collect();
        for (name, _) in BABEL_LANGUAGES {
            signatures.push(EnvironmentSignature::new(name, IGNORE));
            let tag = babel_tag(name);
            if tag.len() != name.len() {
                signatures.push(EnvironmentSignature::new(&tag, IGNORE));
            }
        }
        return signatures;
    });
    return &SIGNATURES;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn babel_names_resolve_to_tags() {
        assert_eq!(babel_language("ngerman"), Some("de-DE"));
        assert_eq!(babel_language("british"), Some("en-GB"));
        assert_eq!(babel_language("it"), None);
        assert_eq!(babel_tag("de-DE-x-simple-language"), "deDExsimplelanguage");
    }

    #[test]
    fn citation_families_use_placeholders() {
        let signatures = command_signatures();
        let cite = signatures.iter().find(|signature| return signature.prototype() == "\\cite{}").unwrap();
        assert_eq!(cite.action(), DUMMY);
        let cites = signatures.iter().find(|signature| return signature.prototype() == "\\cites{}").unwrap();
        assert_eq!(cites.action(), PLURAL);
        assert!(signatures.iter().any(|signature| return signature.prototype() == "\\textngerman{}"));
    }

    #[test]
    fn babel_environments_are_ignored() {
        let names: Vec<_> = environment_signatures().iter().map(EnvironmentSignature::name).collect();
        assert!(names.contains(&"verbatim"));
        assert!(names.contains(&"de-DE"));
        assert!(names.contains(&"deDE"));
    }
}
