// All LLM prompt constants for the screening backend.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for job description parsing.
pub const JD_PARSE_SYSTEM: &str = "You are an assistant that extracts key job description \
    information from text. Return only the job details in valid JSON format using the keys: \
    title, company, location, requirements (as a list), responsibilities (as a list), \
    benefits (as a list), and experience.";

/// Job description parsing prompt. Fill `{jd_text}` with `fill_template`.
pub const JD_PARSE_PROMPT_TEMPLATE: &str = "Extract the key job information from the text below. \
Return only valid JSON with the following keys: title, company, location, requirements, \
responsibilities, benefits, experience. Do not include any extraneous information.

Job description:
{jd_text}";

/// System prompt for resume parsing.
pub const RESUME_PARSE_SYSTEM: &str = "You are an assistant that extracts candidate resume \
    details. Extract only the information following this JSON schema: \
    { name: string, work_experiences: string[], location: string, skills: string[], \
    education: string[], summary?: string, certifications?: string[], languages?: string[] }";

/// Resume parsing prompt. Fill `{resume_text}` with `fill_template`.
pub const RESUME_PARSE_PROMPT_TEMPLATE: &str =
    "Extract resume details from the following resume text:

{resume_text}";

/// System prompt for candidate scoring.
pub const SCORE_SYSTEM: &str = "You are an unbiased hiring manager. Compare the following job \
    description with the candidate's resume and provide scores (0-100) for relevance, \
    experience, and skills. Also compute an overall score that reflects the candidate's fit \
    and provide a comment explaining your evaluation. Return only valid JSON using the \
    following schema: \
    { name: string, relevance: number, experience: number, skills: number, overall: number, comment: string }";

/// Candidate scoring prompt. Fill `{job_json}` and `{resume_json}` with `fill_template`.
pub const SCORE_PROMPT_TEMPLATE: &str = "Job Description:
{job_json}

Candidate Resume:
{resume_json}";

/// System prompt for candidate emails. Output is plain text, not JSON.
pub const EMAIL_SYSTEM: &str = "You are an unbiased HR professional. Your task is to craft a \
    clear, concise, and professional email response based on the provided job description and \
    candidate evaluation. Return only the email body as plain text.";

/// Email prompt. Fill `{job_json}`, `{candidate_json}` and `{instruction}` with `fill_template`.
pub const EMAIL_PROMPT_TEMPLATE: &str = "Job Description (structured):
{job_json}

Candidate Evaluation (structured):
{candidate_json}

{instruction}";

pub const ACCEPT_INSTRUCTION: &str = "Please create an invitation email inviting the candidate \
    for a quick call. The email should be friendly, professional, and include a scheduling request.";

pub const REJECT_INSTRUCTION: &str = "Please create a polite rejection email. Include \
    constructive feedback and key suggestions for improvement based on the candidate's evaluation.";

/// Substitutes `{key}` placeholders in one pass over `template`.
///
/// Inserted values are never rescanned, so a resume or comment that happens to
/// contain `{instruction}` stays literal. Unknown `{...}` text is kept as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let placeholder = values.iter().find_map(|(key, value)| {
            let after = tail.strip_prefix('{')?.strip_prefix(key)?.strip_prefix('}')?;
            Some((*value, after))
        });
        match placeholder {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
